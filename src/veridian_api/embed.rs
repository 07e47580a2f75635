//! Parsing for the legacy XML "embed apps" endpoint.
//!
//! The endpoint returns `<apps>` with one `<app>` element per entry. Each
//! `<app>` child element is limited to a fixed allow-list of field names;
//! unknown child elements are ignored, not errors.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::veridian_api::resources::EmbedApp;
use crate::veridian_api::types::ApiError;

pub(crate) fn parse_embed_apps(xml: &str) -> Result<Vec<EmbedApp>, ApiError> {
    let mut reader = Reader::from_str(xml);
    let mut apps = Vec::new();
    let mut current: Option<EmbedApp> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if name == "app" {
                    current = Some(EmbedApp::default());
                    field = None;
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Ok(Event::Text(text)) => {
                if let (Some(app), Some(name)) = (current.as_mut(), field.as_deref()) {
                    let value = text.unescape().map_err(|e| {
                        ApiError::Shape(format!("invalid embed apps XML text: {}", e))
                    })?;
                    apply_field(app, name, value.trim());
                }
            }
            Ok(Event::CData(data)) => {
                if let (Some(app), Some(name)) = (current.as_mut(), field.as_deref()) {
                    let value = String::from_utf8_lossy(&data).into_owned();
                    apply_field(app, name, value.trim());
                }
            }
            Ok(Event::End(end)) => {
                if end.name().as_ref() == b"app" {
                    if let Some(app) = current.take() {
                        apps.push(app);
                    }
                } else {
                    field = None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ApiError::Shape(format!("invalid embed apps XML: {}", e))),
        }
    }

    Ok(apps)
}

// Fixed allow-list of app child elements; anything else is dropped.
fn apply_field(app: &mut EmbedApp, name: &str, value: &str) {
    match name {
        "id" => app.id = value.parse().ok(),
        "icon" => app.icon = Some(value.to_string()),
        "name" => app.name = Some(value.to_string()),
        "provisioned" => app.provisioned = value.parse().ok(),
        "extension_required" => app.extension_required = parse_bool(value),
        "personal" => app.personal = parse_bool(value),
        "login_id" => app.login_id = value.parse().ok(),
        _ => {}
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
