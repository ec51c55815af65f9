// ── Node ──────────────────────────────────────────────────────────────────

/// A node in a descriptor parse tree.
///
/// The set of kinds is closed and matched exhaustively; adding a kind is a
/// compile-time event for every consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Top-level container: comments and assignments in document order.
    /// Built once per parse, appended to while parsing, never mutated after.
    Root(Vec<Node>),
    /// `key = value`; the value is a `Value` or an `Array`.
    Assignment { name: String, value: Box<Node> },
    /// `{ "a" "b" }`; flat, ordered, elements are `Value` nodes.
    Array(Vec<Node>),
    /// A single scalar string (quoted or bare in the source).
    Value(String),
    /// `# ...` body text. Kept for pretty-printing, skipped by evaluation.
    Comment(String),
}

const INDENT: &str = "  ";

impl Node {
    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Root(_) => "document root",
            Node::Assignment { .. } => "assignment",
            Node::Array(_) => "array",
            Node::Value(_) => "value",
            Node::Comment(_) => "comment",
        }
    }

    /// Renders the tree in an indented diagnostic format.
    ///
    /// The output is for humans and logs; it is not descriptor syntax and is
    /// not guaranteed to re-parse.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(&mut out, 0);
        out
    }

    fn pretty_into(&self, out: &mut String, depth: usize) {
        match self {
            Node::Root(children) => {
                line(out, depth, "root:");
                for child in children {
                    child.pretty_into(out, depth + 1);
                }
            }
            Node::Assignment { name, value } => {
                line(out, depth, &format!("assignment: {name}"));
                value.pretty_into(out, depth + 1);
            }
            Node::Array(items) => {
                line(out, depth, "array:");
                for item in items {
                    item.pretty_into(out, depth + 1);
                }
            }
            Node::Value(text) => line(out, depth, &format!("value: {text}")),
            Node::Comment(body) => line(out, depth, &format!("comment:{body}")),
        }
    }
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

// ── tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_prints_an_indented_tree() {
        let root = Node::Root(vec![
            Node::Comment(" header".to_string()),
            Node::Assignment {
                name: "name".to_string(),
                value: Box::new(Node::Value("My Mod".to_string())),
            },
            Node::Assignment {
                name: "tags".to_string(),
                value: Box::new(Node::Array(vec![
                    Node::Value("Fun".to_string()),
                    Node::Value("Gameplay".to_string()),
                ])),
            },
        ]);
        assert_eq!(
            root.pretty(),
            "root:\n\
             \x20 comment: header\n\
             \x20 assignment: name\n\
             \x20   value: My Mod\n\
             \x20 assignment: tags\n\
             \x20   array:\n\
             \x20     value: Fun\n\
             \x20     value: Gameplay\n"
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!(Node::Root(Vec::new()).kind(), "document root");
        assert_eq!(Node::Value(String::new()).kind(), "value");
        assert_eq!(Node::Comment(String::new()).kind(), "comment");
    }
}
