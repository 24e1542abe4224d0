pub mod section;
pub mod site;

pub use section::{ListGroup, Section, SectionNode};
pub use site::{SiteNode, SitePage};
