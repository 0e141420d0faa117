//! Minimal HTML pages for the submission and configuration forms.

use evaluate::BundleField;

pub const SUBMISSION_FIELD: &str = "submission";

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
pre{white-space:pre-wrap;background:#f6f6f6;padding:1rem;border-radius:4px}\
label{display:block;margin-top:1rem}";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

pub fn index_page() -> String {
    layout(
        "Submit assignment",
        &format!(
            r#"<h1>Submit assignment</h1>
<form method="post" action="/" enctype="multipart/form-data">
<label>Assignment (.docx) <input type="file" name="{SUBMISSION_FIELD}" accept=".docx" required></label>
<p><button type="submit">Evaluate</button></p>
</form>"#
        ),
    )
}

pub fn result_page(evaluation: &str) -> String {
    layout(
        "Evaluation",
        &format!(
            r#"<h1>Evaluation</h1>
<pre>{}</pre>
<p><a href="/">Evaluate another assignment</a></p>"#,
            escape_html(evaluation)
        ),
    )
}

/// Configuration form listing which artifacts are currently stored
pub fn config_page(status: &[(BundleField, bool)]) -> String {
    let rows: String = status
        .iter()
        .map(|(field, present)| {
            format!(
                "<li>{}: {}</li>\n",
                field.label(),
                if *present { "stored" } else { "not set" }
            )
        })
        .collect();

    let mut inputs = String::new();
    for field in BundleField::ALL {
        if field.is_document() {
            inputs.push_str(&format!(
                r#"<label>{} (.docx) <input type="file" name="{}" accept=".docx"></label>
"#,
                field.label(),
                field.form_name()
            ));
        }
    }

    layout(
        "Grader configuration",
        &format!(
            r#"<h1>Grader configuration</h1>
<ul>
{rows}</ul>
<form method="post" action="/config" enctype="multipart/form-data">
{inputs}<label>{instruction_label}<br><textarea name="{instruction}" rows="8" cols="70"></textarea></label>
<p>Fields left empty keep their stored value.</p>
<p><button type="submit">Save</button></p>
</form>"#,
            instruction_label = BundleField::Instruction.label(),
            instruction = BundleField::Instruction.form_name(),
        ),
    )
}

pub fn error_page(title: &str, message: &str) -> String {
    layout(
        title,
        &format!(
            r#"<h1>{}</h1>
<p>{}</p>
<p><a href="/">Back</a></p>"#,
            escape_html(title),
            escape_html(message)
        ),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
