pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{element, error, header, info, muted, section, status, success, warn};
pub use table::{groups_table, lines_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
