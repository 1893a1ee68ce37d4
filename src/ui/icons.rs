//! Shared UI icons.

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

pub static ASSISTANT: Emoji<'_, '_> = Emoji("💬 ", "> ");
pub static USER: Emoji<'_, '_> = Emoji("🙂 ", "< ");
pub static REPORT: Emoji<'_, '_> = Emoji("📄 ", "[R] ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static HINT: Emoji<'_, '_> = Emoji("💡 ", "? ");
