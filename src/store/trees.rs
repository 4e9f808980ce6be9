pub const DOCUMENTS: &str = "documents";
pub const BACKUPS: &str = "backups";
