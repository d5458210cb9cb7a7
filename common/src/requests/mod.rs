use serde::Deserialize;

/// Query string of `GET /menus`.
///
/// Every field is optional at the extractor level so the handler can answer a
/// missing parameter with its own message instead of the framework default.
/// Example: `/menus?hall=Stevenson&meal=Dinner&date=2026-01-08`.
#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    pub hall: Option<String>,
    pub meal: Option<String>,
    pub date: Option<String>,
}
