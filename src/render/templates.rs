//! HTML fragments for rendered documents, using Handlebars for
//! templating. Values rendered with `{{ }}` are escaped. Triple braces
//! are used only for markup that was built and escaped elsewhere.

use std::fmt;

use anyhow::Result;
use handlebars::Handlebars;

#[derive(Debug)]
pub enum Template {
    Document,
    MessageHeader,
    Attachments,
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Template> for String {
    fn from(item: Template) -> String {
        format!("{:?}", item)
    }
}

pub const PAGE_BREAK: &str = r#"<div class="page-break" style="page-break-before:always"></div>"#;

const DOCUMENT_TEMPLATE: &str = r#"<html>
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style type="text/css">
body{padding:0 10px;min-width:{{width}}px;-webkit-print-color-adjust:exact;}
body>dl.email-meta{font-family:"Helvetica Neue",Helvetica,Arial,sans-serif;font-size:14px;padding:0 0 10px;margin:0 0 5px;border-bottom:1px solid #ddd;}
body>dl.email-meta dt{color:#888;float:left;clear:left;width:60px;text-align:right;padding-right:5px}
body>dl.email-meta dd{margin-left:60px}
body>dl.email-meta .avatar{float:right}
body>dl.email-meta .avatar img{max-width:1in;}
body>div.email-attachments{font-size:0.85em;color:#999}
</style>
</head>
<body>
{{{content}}}</body>
</html>
"#;

const MESSAGE_HEADER_TEMPLATE: &str = r#"<dl class="email-meta">
<dt>From:</dt> <dd>{{{from}}}</dd>{{#if avatar}} <dd class="avatar"><img src="{{{avatar}}}" /></dd>{{/if}}
<dt>Subject:</dt> <dd>{{subject}}</dd>
<dt>Date:</dt> <dd>{{date}}</dd>
<dt>To:</dt> <dd>{{{to}}}</dd>
{{#if cc}}<dt>Cc:</dt> <dd>{{{cc}}}</dd>
{{/if}}{{#if bcc}}<dt>Bcc:</dt> <dd>{{{bcc}}}</dd>
{{/if}}</dl>
"#;

const ATTACHMENTS_TEMPLATE: &str = r#"<br />
<strong>Attachments:</strong>
<div class="email-attachments">
{{#each attachments}}{{#if data_uri}}<img src="{{{data_uri}}}" alt="&lt;{{name}}&gt;" /><br />
{{else}}&lt;{{name}}&gt;<br />
{{/if}}{{/each}}</div>
"#;

pub fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_template_string(&Template::Document.to_string(), DOCUMENT_TEMPLATE)?;
    registry.register_template_string(
        &Template::MessageHeader.to_string(),
        MESSAGE_HEADER_TEMPLATE,
    )?;
    registry.register_template_string(&Template::Attachments.to_string(), ATTACHMENTS_TEMPLATE)?;
    Ok(registry)
}
