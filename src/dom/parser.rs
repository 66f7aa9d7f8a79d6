use thiserror::Error;

use super::{Dom, Element, NodeId, decode_entities, is_void_element};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),
    #[error("unterminated comment starting at byte {0}")]
    UnterminatedComment(usize),
}

/// Parses a page into a [`Dom`]. Tolerant in the ways a served page needs:
/// doctype is skipped, unknown end tags are ignored, elements still open at
/// the end of input are closed implicitly. Only structurally unreadable
/// input (a tag or comment that never closes) is an error.
pub fn parse(input: &str) -> Result<Dom, ParseError> {
    Parser {
        input,
        pos: 0,
        dom: Dom::new(),
    }
    .run()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    dom: Dom,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> Result<Dom, ParseError> {
        let mut open = vec![self.dom.root()];

        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            let Some(lt) = rest.find('<') else {
                let tail = rest.to_string();
                self.text(*open.last().unwrap(), &tail);
                break;
            };
            if lt > 0 {
                let chunk = rest[..lt].to_string();
                self.text(*open.last().unwrap(), &chunk);
                self.pos += lt;
            }
            let rest = &self.input[self.pos..];

            if rest.starts_with("<!--") {
                self.comment(*open.last().unwrap())?;
            } else if rest.starts_with("<!") {
                self.skip_declaration()?;
            } else if rest.starts_with("</") {
                self.end_tag(&mut open)?;
            } else {
                self.start_tag(&mut open)?;
            }
        }
        Ok(self.dom)
    }

    fn text(&mut self, parent: NodeId, raw: &str) {
        if !raw.is_empty() {
            self.dom.create_text(parent, &decode_entities(raw));
        }
    }

    fn comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let start = self.pos;
        let body = &self.input[self.pos + 4..];
        let end = body
            .find("-->")
            .ok_or(ParseError::UnterminatedComment(start))?;
        self.dom.create_comment(parent, &body[..end]);
        self.pos += 4 + end + 3;
        Ok(())
    }

    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let end = self.input[self.pos..]
            .find('>')
            .ok_or(ParseError::UnterminatedTag(start))?;
        self.pos += end + 1;
        Ok(())
    }

    fn end_tag(&mut self, open: &mut Vec<NodeId>) -> Result<(), ParseError> {
        let start = self.pos;
        let end = self.input[self.pos..]
            .find('>')
            .ok_or(ParseError::UnterminatedTag(start))?;
        let name = self.input[self.pos + 2..self.pos + end]
            .trim()
            .to_ascii_lowercase();
        self.pos += end + 1;

        // Close up to the nearest matching open element; a stray end tag
        // matches nothing and is dropped.
        if let Some(depth) = open
            .iter()
            .rposition(|&id| self.dom.tag_name(id) == Some(name.as_str()))
        {
            open.truncate(depth);
        }
        Ok(())
    }

    fn start_tag(&mut self, open: &mut Vec<NodeId>) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1; // consume '<'
        let name = self.read_name();
        if name.is_empty() {
            // A lone '<' in prose; treat it as text.
            self.dom.create_text(*open.last().unwrap(), "<");
            return Ok(());
        }

        let mut element = Element::new(&name);
        let mut self_closed = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnterminatedTag(start)),
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                Some('/') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    match self.peek() {
                        Some('>') => {
                            self.pos += 1;
                            self_closed = true;
                            break;
                        }
                        None => return Err(ParseError::UnterminatedTag(start)),
                        Some(_) => continue,
                    }
                }
                Some(_) => {
                    let attr = self.read_name();
                    if attr.is_empty() {
                        // Unreadable garbage inside the tag; skip one char
                        // rather than loop forever.
                        self.pos += self.peek().map(|c| c.len_utf8()).unwrap_or(1);
                        continue;
                    }
                    self.skip_whitespace();
                    if self.peek() == Some('=') {
                        self.pos += 1;
                        self.skip_whitespace();
                        let value = self.read_attr_value(start)?;
                        element.set_attr(&attr, &decode_entities(&value));
                    } else {
                        element.set_attr(&attr, "");
                    }
                }
            }
        }

        let parent = *open.last().unwrap();
        let id = self.dom.create_element(parent, element);

        if self_closed || is_void_element(&name) {
            return Ok(());
        }
        if name == "script" || name == "style" {
            self.raw_text(id, &name, start)?;
            return Ok(());
        }
        open.push(id);
        Ok(())
    }

    /// `script` and `style` swallow everything up to their end tag.
    fn raw_text(&mut self, id: NodeId, name: &str, start: usize) -> Result<(), ParseError> {
        let closer = format!("</{}", name);
        let lower = self.input[self.pos..].to_ascii_lowercase();
        let end = lower
            .find(&closer)
            .ok_or(ParseError::UnterminatedTag(start))?;
        let body = &self.input[self.pos..self.pos + end];
        if !body.is_empty() {
            self.dom.create_text(id, body);
        }
        self.pos += end;
        let gt = self.input[self.pos..]
            .find('>')
            .ok_or(ParseError::UnterminatedTag(start))?;
        self.pos += gt + 1;
        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn read_name(&mut self) -> String {
        let rest = &self.input[self.pos..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        let name = rest[..end].to_ascii_lowercase();
        self.pos += end;
        name
    }

    fn read_attr_value(&mut self, start: usize) -> Result<String, ParseError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let rest = &self.input[self.pos..];
                let end = rest
                    .find(quote)
                    .ok_or(ParseError::UnterminatedTag(start))?;
                let value = rest[..end].to_string();
                self.pos += end + 1;
                Ok(value)
            }
            _ => {
                let rest = &self.input[self.pos..];
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .unwrap_or(rest.len());
                let value = rest[..end].to_string();
                self.pos += end;
                Ok(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_markup_with_attributes() {
        let dom = parse(
            r#"<!doctype html>
<html><body>
<nav id="sidebar-nav">
  <a class="nav-item" data-url="dashboard" href="/dashboard/">Dashboard
    <span class="rounded-full bg-slate-700 text-slate-300">3</span>
  </a>
</nav>
</body></html>"#,
        )
        .unwrap();

        let nav = dom.find_by_id("sidebar-nav").unwrap();
        let links = dom.elements_by_tag_class(nav, "a", "nav-item");
        assert_eq!(links.len(), 1);
        assert_eq!(dom.data(links[0], "url"), Some("dashboard"));
        assert_eq!(dom.attr(links[0], "href"), Some("/dashboard/"));
        let badges = dom.elements_by_tag_class(links[0], "span", "rounded-full");
        assert_eq!(badges.len(), 1);
        assert_eq!(dom.text_content(badges[0]).trim(), "3");
    }

    #[test]
    fn void_elements_do_not_nest() {
        let dom = parse("<div><img src=\"x.png\"><p>after</p></div>").unwrap();
        let root = dom.root();
        let div = dom.children(root)[0];
        assert_eq!(dom.tag_name(div), Some("div"));
        // img and p are siblings, not parent/child
        let tags: Vec<_> = dom
            .children(div)
            .iter()
            .filter_map(|&c| dom.tag_name(c))
            .collect();
        assert_eq!(tags, vec!["img", "p"]);
    }

    #[test]
    fn unquoted_and_bare_attributes() {
        let dom = parse("<input type=checkbox checked name='x'>").unwrap();
        let input = dom.children(dom.root())[0];
        assert_eq!(dom.attr(input, "type"), Some("checkbox"));
        assert_eq!(dom.attr(input, "checked"), Some(""));
        assert_eq!(dom.attr(input, "name"), Some("x"));
    }

    #[test]
    fn comments_and_stray_end_tags_are_tolerated() {
        let dom = parse("<div><!-- menu --></span><p>ok</p></div>").unwrap();
        let div = dom.children(dom.root())[0];
        let tags: Vec<_> = dom
            .children(div)
            .iter()
            .filter_map(|&c| dom.tag_name(c))
            .collect();
        assert_eq!(tags, vec!["p"]);
    }

    #[test]
    fn unclosed_elements_close_at_end_of_input() {
        let dom = parse("<div><a data-url=settings>Settings").unwrap();
        let div = dom.children(dom.root())[0];
        let a = dom.children(div)[0];
        assert_eq!(dom.data(a, "url"), Some("settings"));
        assert_eq!(dom.text_content(a), "Settings");
    }

    #[test]
    fn script_bodies_are_raw() {
        let dom = parse("<script>if (a < b) { go(); }</script><p>x</p>").unwrap();
        let script = dom.children(dom.root())[0];
        assert_eq!(dom.tag_name(script), Some("script"));
        assert_eq!(dom.text_content(script), "if (a < b) { go(); }");
    }

    #[test]
    fn entities_in_text_and_attributes_decode() {
        let dom = parse(r#"<a title="Tom &amp; Co">R&amp;D</a>"#).unwrap();
        let a = dom.children(dom.root())[0];
        assert_eq!(dom.attr(a, "title"), Some("Tom & Co"));
        assert_eq!(dom.text_content(a), "R&D");
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        assert!(parse("<div class=\"x").is_err());
        assert!(parse("<!-- never closed").is_err());
    }

    #[test]
    fn page_shell_round_trips_through_serialize() {
        let src = "<html><body><div data-waypost-slot=\"sidebar\"></div><main><h1>Hi</h1></main></body></html>";
        let dom = parse(src).unwrap();
        let out = dom.to_html(dom.root());
        assert!(out.contains("data-waypost-slot=\"sidebar\""));
        assert!(out.contains("<main><h1>Hi</h1></main>"));
    }
}
