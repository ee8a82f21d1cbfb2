//! Byte-exact frontmatter splitting
//!
//! Reassembly must reproduce untouched documents exactly, so the split keeps
//! the original delimiter lines and line endings instead of re-rendering them.

/// A markdown document split into its frontmatter block and body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
    pub frontmatter: Option<Frontmatter<'a>>,
    pub body: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frontmatter<'a> {
    /// The whole block, delimiters and trailing line break included
    pub raw: &'a str,
    /// YAML between the delimiters
    pub yaml: &'a str,
}

/// Split `content` at a leading `---` block. A block that is never closed is
/// treated as body text.
pub fn split(content: &str) -> Document<'_> {
    let no_frontmatter = Document {
        frontmatter: None,
        body: content,
    };

    let Some(first_break) = content.find('\n') else {
        return no_frontmatter;
    };
    if content[..first_break].trim_end_matches('\r') != "---" {
        return no_frontmatter;
    }

    let yaml_start = first_break + 1;
    let mut line_start = yaml_start;
    while line_start <= content.len() {
        let line_end = content[line_start..]
            .find('\n')
            .map_or(content.len(), |i| line_start + i);
        let line = content[line_start..line_end].trim_end_matches('\r');

        if line == "---" {
            let block_end = (line_end + 1).min(content.len());
            return Document {
                frontmatter: Some(Frontmatter {
                    raw: &content[..block_end],
                    yaml: &content[yaml_start..line_start],
                }),
                body: &content[block_end..],
            };
        }

        if line_end >= content.len() {
            break;
        }
        line_start = line_end + 1;
    }

    no_frontmatter
}

/// First markdown heading text in `body`
pub fn first_heading(body: &str) -> Option<&str> {
    body.lines()
        .map(str::trim)
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim())
        .filter(|heading| !heading.is_empty())
}
