//! HTML document rendering for exported messages.

/// Header values shown at the top of an exported message.
#[derive(Debug, Clone, Default)]
pub struct MessageMeta {
    /// Subject header, verbatim.
    pub subject: String,
    /// From header, verbatim.
    pub from: String,
    /// To header, verbatim.
    pub to: String,
    /// Cc header; an empty value omits the Cc row entirely.
    pub cc: String,
    /// Already formatted date string.
    pub date: String,
}

/// Render the full HTML document for one message.
///
/// `body_html` lands in the document verbatim; an empty body renders an
/// empty body section rather than failing.
pub fn render_message(meta: &MessageMeta, body_html: &str) -> String {
    let subject = &meta.subject;
    let from_addr = &meta.from;
    let to_addr = &meta.to;
    let date = &meta.date;
    let cc_row = if meta.cc.is_empty() {
        String::new()
    } else {
        format!("<p><strong>Cc:</strong> {}</p>\n        ", meta.cc)
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{subject}</title>
    <style>
        .email-header {{
            background-color: #f0f0f0;
            padding: 15px;
            margin-bottom: 20px;
            border-radius: 5px;
            font-family: Arial, sans-serif;
        }}
        .email-header p {{
            margin: 5px 0;
        }}
        .email-header strong {{
            display: inline-block;
            width: 80px;
        }}
    </style>
</head>
<body>
    <div class="email-header">
        <p><strong>Subject:</strong> {subject}</p>
        <p><strong>From:</strong> {from_addr}</p>
        <p><strong>To:</strong> {to_addr}</p>
        {cc_row}<p><strong>Date:</strong> {date}</p>
    </div>
    <div class="email-body">
        {body_html}
    </div>
</body>
</html>"#
    )
}
