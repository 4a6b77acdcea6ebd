use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").unwrap_or_else(|e| panic!("Bad selector `table`: {e:?}"))
});

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// A parsed HTML document.
///
/// `scraper` documents are not `Send`; keep a `Page` on the task that parsed
/// it.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Every `<table>` element in document order, nested ones included.
    pub fn tables(&self) -> Vec<ElementRef<'_>> {
        self.document.select(&TABLE_SELECTOR).collect()
    }

    pub fn table_count(&self) -> usize {
        self.document.select(&TABLE_SELECTOR).count()
    }
}

/// Rows of a table in DOM `rows` order: header-group rows, then body rows
/// (direct `tr` children and `tbody` rows, in source order), then footer
/// rows. Rows belonging to nested tables are never included.
pub(crate) fn table_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    let mut foot = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => body.push(child),
            "thead" => head.extend(section_rows(child)),
            "tbody" => body.extend(section_rows(child)),
            "tfoot" => foot.extend(section_rows(child)),
            _ => {}
        }
    }

    head.extend(body);
    head.extend(foot);
    head
}

fn section_rows<'a>(section: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    section
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr")
}

/// Direct `td`/`th` children of a row.
pub(crate) fn row_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

/// The table's own `<caption>`, if any.
pub(crate) fn table_caption<'a>(table: ElementRef<'a>) -> Option<ElementRef<'a>> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "caption")
}

/// The previous element sibling, when it is an `h1`..`h6` heading.
pub(crate) fn preceding_heading<'a>(table: ElementRef<'a>) -> Option<ElementRef<'a>> {
    table
        .prev_siblings()
        .find_map(ElementRef::wrap)
        .filter(|el| HEADING_TAGS.contains(&el.value().name()))
}
