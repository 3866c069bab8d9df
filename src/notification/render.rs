use serde::Serialize;

use crate::config::ThemeConfig;

use super::{NotificationId, NotificationRecord};

/// Element holding a class and a text node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextElement {
    pub class_name: String,
    pub text: String,
}

/// Presentation of a single notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedNotification {
    pub id: NotificationId,
    /// Container classes: main class plus the status class
    pub class_name: String,
    pub icon_class: String,
    /// Present only when the record has a non-empty title
    pub title: Option<TextElement>,
    pub message: TextElement,
    /// Whether a click handler is attached
    pub clickable: bool,
}

impl RenderedNotification {
    pub fn new(record: &NotificationRecord, theme: &ThemeConfig) -> Self {
        Self {
            id: record.id,
            class_name: format!("{} {}-{}", theme.main, theme.main, record.status),
            icon_class: theme.icon.clone(),
            title: record.display_title().map(|title| TextElement {
                class_name: theme.title.clone(),
                text: title.to_string(),
            }),
            message: TextElement {
                class_name: theme.message.clone(),
                text: record.message.clone(),
            },
            clickable: record.dismissible,
        }
    }

    /// Serialize as `<div><i/><h4/>?<p/></div>` markup
    pub fn to_html(&self) -> String {
        let mut html = format!(
            r#"<div class="{}"><i class="{}"></i>"#,
            escape(&self.class_name),
            escape(&self.icon_class)
        );
        if let Some(title) = &self.title {
            html.push_str(&format!(
                r#"<h4 class="{}">{}</h4>"#,
                escape(&title.class_name),
                escape(&title.text)
            ));
        }
        html.push_str(&format!(
            r#"<p class="{}">{}</p></div>"#,
            escape(&self.message.class_name),
            escape(&self.message.text)
        ));
        html
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
