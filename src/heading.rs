use crate::model::UNTITLED_SECTION;

/// Heading stamp applied to a captured piece of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingStamp {
    pub heading: String,
    pub path: Vec<String>,
    pub level: usize,
}

/// Current heading path of one extraction run.
///
/// Entries keep the raw level they were declared with (h2, `Heading 3`, ...)
/// so a new heading pops every entry at the same or a deeper level. Skipped
/// levels are kept as-is: h1 followed by h4 gives a two-entry path.
#[derive(Debug, Default, Clone)]
pub struct HeadingContext {
    path: Vec<(u8, String)>,
}

impl HeadingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the title is blank and the context is unchanged.
    pub fn on_heading(&mut self, level: u8, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.descend(level, title);
        true
    }

    pub fn descend(&mut self, level: u8, title: &str) {
        self.path.retain(|(l, _)| *l < level);
        self.path.push((level, title.to_string()));
    }

    pub fn current_path(&self) -> Vec<String> {
        self.path.iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn on_content(&self) -> HeadingStamp {
        let heading = self
            .path
            .last()
            .map(|(_, t)| t.clone())
            .unwrap_or_else(|| UNTITLED_SECTION.to_string());
        HeadingStamp {
            heading,
            path: self.current_path(),
            level: self.path.len(),
        }
    }
}
