//! Server-rendered applicant form.

use loan_status::eligibility::{ModelNotice, NoticeSeverity};
use serde::Deserialize;
use std::fmt::Write;

const MARRIED_OPTIONS: [&str; 2] = ["No", "Yes"];
const DEPENDENTS_OPTIONS: [&str; 4] = ["0", "1", "2", "3+"];
const CREDIT_HISTORY_OPTIONS: [&str; 2] = ["0", "1"];

/// Raw field values posted by the form, echoed back when the page re-renders.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct FormValues {
    #[serde(rename = "Married", default)]
    pub(crate) married: String,
    #[serde(rename = "Dependents", default)]
    pub(crate) dependents: String,
    #[serde(rename = "LoanAmount", default)]
    pub(crate) loan_amount: String,
    #[serde(rename = "Credit_History", default)]
    pub(crate) credit_history: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            married: "No".to_string(),
            dependents: "0".to_string(),
            loan_amount: "100.0".to_string(),
            credit_history: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

impl Tone {
    fn class(self) -> &'static str {
        match self {
            Tone::Success => "success",
            Tone::Info => "info",
            Tone::Warning => "warning",
            Tone::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Message {
    pub(crate) tone: Tone,
    pub(crate) text: String,
}

impl Message {
    pub(crate) fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }
}

impl From<&ModelNotice> for Message {
    fn from(notice: &ModelNotice) -> Self {
        let tone = match notice.severity {
            NoticeSeverity::Warning => Tone::Warning,
            NoticeSeverity::Error => Tone::Error,
        };
        Self::new(tone, notice.message.clone())
    }
}

pub(crate) struct PageView<'a> {
    pub(crate) notice: Option<ModelNotice>,
    pub(crate) values: &'a FormValues,
    pub(crate) results: Vec<Message>,
}

pub(crate) fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<title>Loan Status Prediction</title>\n<style>\n\
body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\n\
label{display:block;margin-top:1rem}\n\
.msg{padding:.75rem;margin:1rem 0;border-radius:.25rem}\n\
.success{background:#e6f4ea}.info{background:#e8f0fe}\n\
.warning{background:#fef7e0}.error{background:#fce8e6}\n\
</style>\n</head>\n<body>\n<h1>Loan Status Prediction</h1>\n",
    );

    if let Some(notice) = &view.notice {
        push_message(&mut html, &Message::from(notice));
    }

    html.push_str("<form method=\"post\" action=\"/predict\">\n<h2>Enter applicant details</h2>\n");
    push_select(&mut html, "Married", &MARRIED_OPTIONS, &view.values.married);
    push_select(
        &mut html,
        "Dependents",
        &DEPENDENTS_OPTIONS,
        &view.values.dependents,
    );
    let _ = write!(
        html,
        "<label for=\"LoanAmount\">LoanAmount</label>\n\
<input id=\"LoanAmount\" name=\"LoanAmount\" type=\"number\" min=\"0\" step=\"0.5\" value=\"{}\">\n",
        escape(&view.values.loan_amount)
    );
    push_select(
        &mut html,
        "Credit_History",
        &CREDIT_HISTORY_OPTIONS,
        &view.values.credit_history,
    );
    html.push_str("<p><button type=\"submit\">Predict Loan Status</button></p>\n");

    for message in &view.results {
        push_message(&mut html, message);
    }

    html.push_str("</form>\n<hr>\n</body>\n</html>\n");
    html
}

fn push_select(html: &mut String, name: &str, options: &[&str], selected: &str) {
    let _ = writeln!(
        html,
        "<label for=\"{name}\">{name}</label>\n<select id=\"{name}\" name=\"{name}\">"
    );
    for option in options {
        let marker = if *option == selected { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{value}\"{marker}>{value}</option>",
            value = escape(option)
        );
    }
    html.push_str("</select>\n");
}

fn push_message(html: &mut String, message: &Message) {
    let _ = writeln!(
        html,
        "<div class=\"msg {}\">{}</div>",
        message.tone.class(),
        escape(&message.text)
    );
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
