//! HTML flattening for the URL fetcher.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// Elements dropped together with everything inside them.
const STRIPPED: [&str; 4] = ["script", "style", "nav", "footer"];

/// Flatten an HTML document to readable text.
///
/// Parses the document, drops comments and `script`/`style`/`nav`/`footer`
/// subtrees, then joins the remaining text nodes with `\n` and keeps the
/// non-blank lines, trimmed. Entities are decoded by the parser.
pub fn html_to_text(html: &str) -> String {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);

    let mut texts = Vec::new();
    collect_text(&dom.document, &mut texts);

    texts
        .join("\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: &Handle, out: &mut Vec<String>) {
    match &node.data {
        NodeData::Element { name, .. } if STRIPPED.contains(&&*name.local) => return,
        NodeData::Text { contents } => {
            out.push(contents.borrow().to_string());
            return;
        }
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => return,
        _ => {}
    }

    for child in node.children.borrow().iter() {
        collect_text(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_non_content_elements() {
        let html = r#"<html><head><style>body { color: red }</style>
            <script type="text/javascript">var x = "<p>no</p>";</script></head>
            <body><nav><a href="/">Home</a></nav>
            <h1>Title</h1><p>First   paragraph.</p>
            <!-- hidden -->
            <footer>Copyright</footer></body></html>"#;
        assert_eq!(html_to_text(html), "Title\nFirst   paragraph.");
    }

    #[test]
    fn unclosed_script_contents_never_leak() {
        assert_eq!(html_to_text("<p>Intro</p><script>var secret = 1;"), "Intro");
        assert_eq!(html_to_text("<p>Kept</p><style>p { color: red }"), "Kept");
    }

    #[test]
    fn tag_matching_is_case_insensitive() {
        let html = "<SCRIPT>alert(1)</SCRIPT><P>Kept</P><Footer class=x>gone</FOOTER>";
        assert_eq!(html_to_text(html), "Kept");
    }

    #[test]
    fn only_exact_element_names_are_stripped() {
        assert_eq!(html_to_text("<navigation>Still here</navigation>"), "Still here");
        assert_eq!(
            html_to_text("<nav-menu>m</nav-menu><p>Keep me</p><nav>n</nav>"),
            "m\nKeep me"
        );
    }

    #[test]
    fn attribute_values_are_not_text() {
        assert_eq!(html_to_text(r#"<img alt="a > b"><p>Body</p>"#), "Body");
    }

    #[test]
    fn lines_are_trimmed_and_blanks_dropped() {
        let html = "<div>\n\n   one  \n\t\n<span> two </span></div>\n\n";
        assert_eq!(html_to_text(html), "one\ntwo");
    }

    #[test]
    fn entities_decoded() {
        assert_eq!(
            html_to_text("<p>Fish &amp; Chips &lt;3 &#39;x&#x27; &copy;</p>"),
            "Fish & Chips <3 'x' ©"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(html_to_text("just text"), "just text");
        assert_eq!(html_to_text(""), "");
    }
}
