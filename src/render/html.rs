use pulldown_cmark::{Options, Parser, html};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 2em; color: #222; }
h1 { border-bottom: 2px solid #4472c4; padding-bottom: .3em; }
h2 { margin-top: 2em; color: #2f5597; }
h3 { margin-top: 1.5em; font-family: Consolas, monospace; font-size: 1em; }
table { border-collapse: collapse; margin: 1em 0; font-size: .9em; }
th, td { border: 1px solid #c9c9c9; padding: 4px 8px; text-align: left; white-space: nowrap; }
th { background: #4472c4; color: #fff; }
tr:nth-child(even) td { background: #f2f6fc; }
code { background: #f3f3f3; padding: 0 .3em; }
"#;

/// Convert the Markdown report body and wrap it in the fixed stylesheet.
pub fn render_html(markdown: &str, title: &str) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(markdown, opts);

    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
