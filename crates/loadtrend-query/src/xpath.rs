//! Compiled report queries.
//!
//! The supported language is the XPath subset report queries are written in:
//!
//! ```text
//! query     := step+ terminal
//! step      := ("/" | "//") (name | "*") predicate*
//! predicate := "[" "@" name ( "=" quoted )? "]" | "[" position "]"
//! terminal  := "/" "@" name | "/" "text()"
//! ```
//!
//! A position counts among the nodes one context node yields for the step.
//! On a `/` step that is the node's matching children, as in XPath. On a
//! `//` step it is all matching descendants in document order, so
//! `//item[2]` means `(//item)[2]` rather than every second `item` child.
//!
//! Queries are compiled once and evaluated against any number of documents.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::document::{Element, ReportDocument};
use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NameTest {
    Any,
    Named(String),
}

impl NameTest {
    fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Any => true,
            Self::Named(name) => element.name() == name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    HasAttribute(String),
    AttributeEquals(String, String),
    /// One-based position among the candidates one context node yields.
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: NameTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Terminal {
    Attribute(String),
    Text,
}

/// A compiled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    source: String,
    steps: Vec<Step>,
    terminal: Terminal,
}

impl Query {
    /// Compiles `source`, reporting the byte offset of the first syntax error.
    pub fn parse(source: &str) -> QueryResult<Self> {
        Parser::new(source).parse()
    }

    /// The query text as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the value selected by the first matching node, if any.
    ///
    /// Nodes are visited in document order. For `@attr` the first element
    /// carrying the attribute wins; for `text()` the first element with
    /// non-blank direct text wins.
    #[must_use]
    pub fn evaluate<'d>(&self, document: &'d ReportDocument) -> Option<&'d str> {
        let mut context: Vec<&'d Element> = Vec::new();

        for (index, step) in self.steps.iter().enumerate() {
            let mut next: Vec<&'d Element> = Vec::new();
            let mut seen: HashSet<*const Element> = HashSet::new();

            if index == 0 {
                let root = document.root();
                let candidates = match step.axis {
                    Axis::Child => vec![root],
                    Axis::Descendant => {
                        let mut all = vec![root];
                        all.extend(root.descendants());
                        all
                    }
                };
                collect(step, candidates, &mut next, &mut seen);
            } else {
                for element in context.iter().copied() {
                    let candidates = match step.axis {
                        Axis::Child => element.children().iter().collect(),
                        Axis::Descendant => element.descendants(),
                    };
                    collect(step, candidates, &mut next, &mut seen);
                }
            }

            if next.is_empty() {
                return None;
            }
            context = next;
        }

        context.into_iter().find_map(|element| match &self.terminal {
            Terminal::Attribute(name) => element.attribute(name),
            Terminal::Text => {
                let text = element.text();
                (!text.trim().is_empty()).then_some(text)
            }
        })
    }
}

fn collect<'d>(
    step: &Step,
    candidates: Vec<&'d Element>,
    out: &mut Vec<&'d Element>,
    seen: &mut HashSet<*const Element>,
) {
    let mut selected: Vec<&'d Element> = candidates
        .into_iter()
        .filter(|element| step.name.matches(element))
        .collect();

    for predicate in &step.predicates {
        selected = match predicate {
            Predicate::HasAttribute(name) => selected
                .into_iter()
                .filter(|element| element.attribute(name).is_some())
                .collect(),
            Predicate::AttributeEquals(name, value) => selected
                .into_iter()
                .filter(|element| element.attribute(name) == Some(value.as_str()))
                .collect(),
            Predicate::Position(position) => selected
                .get(position - 1)
                .copied()
                .into_iter()
                .collect(),
        };
    }

    for element in selected {
        if seen.insert(element as *const Element) {
            out.push(element);
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn parse(mut self) -> QueryResult<Query> {
        self.skip_whitespace();
        if self.at_end() {
            return Err(self.error("empty query"));
        }

        let mut steps = Vec::new();
        loop {
            let axis = if self.eat("//") {
                Axis::Descendant
            } else if self.eat("/") {
                Axis::Child
            } else {
                return Err(self.error("expected `/`"));
            };

            if self.peek() == Some('@') || self.rest().starts_with("text()") {
                if axis == Axis::Descendant {
                    return Err(self.error("`//` cannot select an attribute or text"));
                }
                if steps.is_empty() {
                    return Err(self.error("expected an element step"));
                }
                let terminal = self.parse_terminal()?;
                self.skip_whitespace();
                if !self.at_end() {
                    return Err(self.error("unexpected input after terminal step"));
                }
                return Ok(Query {
                    source: self.source.trim().to_string(),
                    steps,
                    terminal,
                });
            }

            let name = if self.eat("*") {
                NameTest::Any
            } else {
                NameTest::Named(self.parse_name()?)
            };

            let mut predicates = Vec::new();
            while self.peek() == Some('[') {
                predicates.push(self.parse_predicate()?);
            }
            steps.push(Step {
                axis,
                name,
                predicates,
            });

            self.skip_whitespace();
            if self.at_end() {
                return Err(self.error("query must end with `@attribute` or `text()`"));
            }
        }
    }

    fn parse_terminal(&mut self) -> QueryResult<Terminal> {
        if self.eat("text()") {
            return Ok(Terminal::Text);
        }
        self.expect('@')?;
        Ok(Terminal::Attribute(self.parse_name()?))
    }

    fn parse_predicate(&mut self) -> QueryResult<Predicate> {
        self.expect('[')?;
        self.skip_whitespace();

        let predicate = if self.eat("@") {
            let name = self.parse_name()?;
            self.skip_whitespace();
            if self.eat("=") {
                self.skip_whitespace();
                let value = self.parse_quoted()?;
                Predicate::AttributeEquals(name, value)
            } else {
                Predicate::HasAttribute(name)
            }
        } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let start = self.pos;
            let digits = self.take_while(|c| c.is_ascii_digit());
            match digits.parse::<usize>() {
                Ok(position) if position > 0 => Predicate::Position(position),
                _ => {
                    return Err(QueryError::Syntax {
                        query: self.source.to_string(),
                        offset: start,
                        message: "position must be a positive integer".to_string(),
                    })
                }
            }
        } else {
            return Err(self.error("expected `@attribute` or a position"));
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(predicate)
    }

    fn parse_quoted(&mut self) -> QueryResult<String> {
        let quote = match self.peek() {
            Some(quote @ ('\'' | '"')) => quote,
            _ => return Err(self.error("expected a quoted value")),
        };
        let start = self.pos;
        self.pos += quote.len_utf8();

        match self.rest().find(quote) {
            Some(len) => {
                let value = self.rest()[..len].to_string();
                self.pos += len + quote.len_utf8();
                Ok(value)
            }
            None => Err(QueryError::Syntax {
                query: self.source.to_string(),
                offset: start,
                message: "unterminated string".to_string(),
            }),
        }
    }

    fn parse_name(&mut self) -> QueryResult<String> {
        let name = self.take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
        if name.is_empty() {
            return Err(self.error("expected a name"));
        }
        Ok(name.to_string())
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !predicate(*c))
            .map_or(self.source.len() - start, |(i, _)| i);
        self.pos += len;
        &self.source[start..start + len]
    }

    fn expect(&mut self, expected: char) -> QueryResult<()> {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected `{expected}`")))
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn error(&self, message: &str) -> QueryError {
        QueryError::Syntax {
            query: self.source.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<report>
  <summary>
    <all-summary>
      <statistic-item type="request" avg="0.4"/>
      <statistic-item type="httppage" avg="1,2"/>
    </all-summary>
    <statistics>
      <statistic name="error_percentile" value="0.5"/>
    </statistics>
  </summary>
  <virtual-users>
    <statistic-item name="UserPath">
      <statistic-item name="Login" avg="0.8"/>
      <statistic-item name="Logout"/>
      <statistic-item name="Logout" avg="0.3"/>
    </statistic-item>
  </virtual-users>
  <comment>  nightly run  </comment>
</report>"#;

    fn doc() -> ReportDocument {
        ReportDocument::parse(REPORT).unwrap()
    }

    fn eval(query: &str) -> Option<String> {
        let document = doc();
        Query::parse(query)
            .unwrap()
            .evaluate(&document)
            .map(str::to_string)
    }

    #[test]
    fn test_attribute_predicate() {
        assert_eq!(
            eval("/report/summary/all-summary/statistic-item[@type='httppage']/@avg").as_deref(),
            Some("1,2")
        );
        assert_eq!(
            eval(r#"/report/summary/statistics/statistic[@name="error_percentile"]/@value"#)
                .as_deref(),
            Some("0.5")
        );
    }

    #[test]
    fn test_first_node_carrying_attribute_wins() {
        assert_eq!(
            eval("/report/virtual-users/statistic-item/statistic-item[@name='Logout']/@avg")
                .as_deref(),
            Some("0.3")
        );
    }

    #[test]
    fn test_descendant_wildcard_and_position() {
        assert_eq!(eval("//statistic-item[@name='Login']/@avg").as_deref(), Some("0.8"));
        assert_eq!(eval("/report/*/all-summary/*[1]/@avg").as_deref(), Some("0.4"));
        assert_eq!(eval("/report/summary//statistic[@value]/@name").as_deref(), Some("error_percentile"));
    }

    #[test]
    fn test_descendant_position_counts_in_document_order() {
        assert_eq!(eval("//statistic-item[3]/@name").as_deref(), Some("UserPath"));
        assert_eq!(
            eval("/report/virtual-users/statistic-item/statistic-item[3]/@name").as_deref(),
            Some("Logout")
        );
        assert_eq!(eval("/report/virtual-users//statistic-item[3]/@avg").as_deref(), None);
    }

    #[test]
    fn test_text_terminal() {
        assert_eq!(eval("/report/comment/text()").as_deref(), Some("  nightly run  "));
        assert_eq!(eval("/report/summary/text()"), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(eval("/report/monitors/monitored-host/@name"), None);
        assert_eq!(eval("/other/summary/@x"), None);
        assert_eq!(eval("/report/summary/all-summary/statistic-item[@type='none']/@avg"), None);
    }

    #[test]
    fn test_source_round_trip() {
        let query = Query::parse("  /report/summary/@x ").unwrap();
        assert_eq!(query.source(), "/report/summary/@x");
        assert_eq!(query.to_string(), "/report/summary/@x");
    }

    #[test]
    fn test_syntax_errors_carry_offset() {
        let cases = [
            ("", 0),
            ("report/@x", 0),
            ("/report/summary", 15),
            ("/report[@name='x]/@y", 14),
            ("/report[0]/@y", 8),
            ("/report/@", 9),
            ("//@avg", 2),
            ("/@avg", 1),
            ("/report/@avg/more", 12),
        ];
        for (query, expected) in cases {
            match Query::parse(query) {
                Err(QueryError::Syntax { offset, .. }) => {
                    assert_eq!(offset, expected, "query {query:?}")
                }
                other => panic!("expected syntax error for {query:?}, got {other:?}"),
            }
        }
    }
}
