use crate::model::ContentType;

/// Structural event produced by a source walk, in source order. Web pages and
/// documents both reduce to this stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { ordered: bool, text: String },
    /// Rows of cell texts.
    Table(Vec<Vec<String>>),
}

impl Block {
    pub fn content_type(&self) -> Option<ContentType> {
        match self {
            Block::Heading { .. } => None,
            Block::Paragraph(_) => Some(ContentType::Paragraph),
            Block::ListItem { ordered: true, .. } => Some(ContentType::OrderedListItem),
            Block::ListItem { ordered: false, .. } => Some(ContentType::UnorderedListItem),
            Block::Table(_) => Some(ContentType::Table),
        }
    }
}

/// Cells joined by ` | `, rows by ` ; `, empty cells and rows skipped.
pub fn table_text(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|c| crate::text::normalize(c))
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join(" ; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(Block::Heading { level: 1, text: "x".into() }.content_type(), None);
        assert_eq!(
            Block::ListItem { ordered: true, text: "x".into() }.content_type(),
            Some(ContentType::OrderedListItem)
        );
        assert_eq!(
            Block::ListItem { ordered: false, text: "x".into() }.content_type(),
            Some(ContentType::UnorderedListItem)
        );
    }

    #[test]
    fn table_text_skips_blank_cells() {
        let rows = vec![
            vec!["Name".to_string(), " Role ".to_string()],
            vec!["".to_string(), "".to_string()],
            vec!["Ada".to_string(), "".to_string(), "Engineer\n".to_string()],
        ];
        assert_eq!(table_text(&rows), "Name | Role ; Ada | Engineer");
    }
}
