/// Icons used across CLI output
pub struct Icons;

impl Icons {
    pub const ROCKET: &'static str = "🚀";
    pub const CHECK: &'static str = "✅";
    pub const CROSS: &'static str = "❌";
    pub const WARN: &'static str = "⚠️";
    pub const INFO: &'static str = "ℹ️";
    pub const DB: &'static str = "🗄️";
    pub const PLUG: &'static str = "🔌";
    pub const SEED: &'static str = "🌱";
    pub const TABLE: &'static str = "📊";
}
