//! Static HTML rendering of expanded Adaptive Cards.
//!
//! Covers the elements the bundled templates use. Unknown element types are
//! skipped so a newer card still renders the parts we understand.

use pulldown_cmark::{html, Options, Parser};
use serde_json::Value;

use super::expander::scalar_text;

/// Renders a whole card into a standalone HTML document.
pub(crate) fn render_document(card: &Value) -> String {
    let mut body = String::new();
    render_elements(card.get("body"), &mut body);
    render_actions(card.get("actions"), &mut body);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>{}</style>\n</head>\n<body>\n<div class=\"ac-card\">\n{}</div>\n</body>\n</html>\n",
        CARD_CSS, body
    )
}

fn render_elements(elements: Option<&Value>, out: &mut String) {
    let Some(Value::Array(elements)) = elements else {
        return;
    };
    for element in elements {
        render_element(element, out);
    }
}

fn render_element(element: &Value, out: &mut String) {
    let kind = element.get("type").and_then(Value::as_str).unwrap_or_default();
    let separator = element
        .get("separator")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if separator {
        out.push_str("<hr>\n");
    }

    match kind {
        "TextBlock" => render_text_block(element, out),
        "Image" => {
            let url = str_field(element, "url");
            if !url.is_empty() {
                out.push_str(&format!(
                    "<img class=\"ac-image\" src=\"{}\" alt=\"{}\">\n",
                    html_escape(url),
                    html_escape(str_field(element, "altText"))
                ));
            }
        }
        "Container" => {
            out.push_str("<div class=\"ac-container\">\n");
            render_elements(element.get("items"), out);
            out.push_str("</div>\n");
        }
        "ColumnSet" => {
            out.push_str("<table class=\"ac-columnset\"><tr>\n");
            if let Some(Value::Array(columns)) = element.get("columns") {
                for column in columns {
                    out.push_str("<td class=\"ac-column\">\n");
                    render_elements(column.get("items"), out);
                    out.push_str("</td>\n");
                }
            }
            out.push_str("</tr></table>\n");
        }
        "FactSet" => {
            out.push_str("<table class=\"ac-factset\">\n");
            if let Some(Value::Array(facts)) = element.get("facts") {
                for fact in facts {
                    out.push_str(&format!(
                        "<tr><th>{}</th><td>{}</td></tr>\n",
                        html_escape(&text_field(fact, "title")),
                        html_escape(&text_field(fact, "value"))
                    ));
                }
            }
            out.push_str("</table>\n");
        }
        "Input.Text" => render_text_input(element, out),
        "ActionSet" => render_actions(element.get("actions"), out),
        _ => {}
    }
}

fn render_text_block(element: &Value, out: &mut String) {
    let text = text_field(element, "text");
    let mut classes = vec!["ac-textblock"];
    match str_field(element, "weight") {
        "Bolder" => classes.push("ac-bolder"),
        "Lighter" => classes.push("ac-lighter"),
        _ => {}
    }
    match str_field(element, "size") {
        "Large" | "ExtraLarge" => classes.push("ac-large"),
        "Medium" => classes.push("ac-medium"),
        "Small" => classes.push("ac-small"),
        _ => {}
    }

    out.push_str(&format!("<div class=\"{}\">", classes.join(" ")));
    out.push_str(&markdown_to_html(&text));
    out.push_str("</div>\n");
}

fn render_text_input(element: &Value, out: &mut String) {
    let id = html_escape(str_field(element, "id"));
    let label = str_field(element, "label");
    let placeholder = html_escape(str_field(element, "placeholder"));

    if !label.is_empty() {
        out.push_str(&format!(
            "<label class=\"ac-label\" for=\"{}\">{}</label>\n",
            id,
            html_escape(label)
        ));
    }

    let multiline = element
        .get("isMultiline")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if multiline {
        out.push_str(&format!(
            "<textarea class=\"ac-input\" id=\"{}\" name=\"{}\" placeholder=\"{}\"></textarea>\n",
            id, id, placeholder
        ));
    } else {
        out.push_str(&format!(
            "<input class=\"ac-input\" type=\"text\" id=\"{}\" name=\"{}\" placeholder=\"{}\">\n",
            id, id, placeholder
        ));
    }
}

fn render_actions(actions: Option<&Value>, out: &mut String) {
    let Some(Value::Array(actions)) = actions else {
        return;
    };
    if actions.is_empty() {
        return;
    }

    out.push_str("<div class=\"ac-actions\">\n");
    for action in actions {
        let title = html_escape(str_field(action, "title"));
        match str_field(action, "type") {
            "Action.OpenUrl" => out.push_str(&format!(
                "<a class=\"ac-action\" href=\"{}\">{}</a>\n",
                html_escape(str_field(action, "url")),
                title
            )),
            _ => out.push_str(&format!(
                "<button class=\"ac-action\" type=\"button\" disabled>{}</button>\n",
                title
            )),
        }
    }
    out.push_str("</div>\n");
}

/// TextBlock markdown, with raw HTML neutralized first.
fn markdown_to_html(text: &str) -> String {
    let escaped = html_escape(text);
    let parser = Parser::new_ext(&escaped, Options::ENABLE_STRIKETHROUGH);
    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);
    html_out.trim_end().to_string()
}

fn str_field<'v>(value: &'v Value, key: &str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn text_field(value: &Value, key: &str) -> String {
    value.get(key).map(scalar_text).unwrap_or_default()
}

/// Simple HTML escaping for text content.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CARD_CSS: &str = "body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;color:#1f2937;}\
.ac-card{max-width:640px;padding:16px;border:1px solid #e5e7eb;border-radius:8px;}\
.ac-bolder{font-weight:bold;}.ac-lighter{color:#6b7280;}\
.ac-large{font-size:1.4em;}.ac-medium{font-size:1.15em;}.ac-small{font-size:0.85em;}\
.ac-factset th{text-align:left;padding-right:12px;}\
.ac-columnset td{vertical-align:top;padding-right:12px;}\
.ac-image{max-height:64px;}";
