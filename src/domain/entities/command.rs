use serde::{Deserialize, Serialize};

/// A keyword trigger and the canned reply it selects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    trigger: String,
    response: String,
}

impl CommandEntry {
    /// Build an entry, lower-casing the trigger. Blank triggers are rejected
    /// because an empty string is a substring of every message.
    pub fn new(trigger: impl Into<String>, response: impl Into<String>) -> Option<Self> {
        let trigger = trigger.into().trim().to_lowercase();
        if trigger.is_empty() {
            return None;
        }
        Some(Self {
            trigger,
            response: response.into(),
        })
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    /// `normalized` must already be lower-cased.
    pub fn matches_exactly(&self, normalized: &str) -> bool {
        self.trigger == normalized
    }

    /// `normalized` must already be lower-cased.
    pub fn occurs_in(&self, normalized: &str) -> bool {
        normalized.contains(self.trigger.as_str())
    }
}

/// Ordered, immutable command table.
///
/// Declaration order is the tie-break when several triggers match, so the
/// table is a sequence rather than a map. Several triggers may share the same
/// response.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
    default_response: String,
}

impl CommandTable {
    pub fn new(entries: Vec<CommandEntry>, default_response: impl Into<String>) -> Self {
        Self {
            entries,
            default_response: default_response.into(),
        }
    }

    /// The bilingual table shipped with the service
    pub fn builtin() -> Self {
        let entries = BUILTIN_COMMANDS
            .iter()
            .filter_map(|(trigger, response)| CommandEntry::new(*trigger, *response))
            .collect();
        Self::new(entries, DEFAULT_RESPONSE)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    pub fn default_response(&self) -> &str {
        &self.default_response
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::builtin()
    }
}

const HELP_RESPONSE: &str = "🆘 الأوامر المتاحة:\n• حالة - لعرض حالة النظام\n• طلب - لإنشاء طلب جديد\n• معلومات - لمعلومات عن الخدمة\n• دعم - للاتصال بالدعم الفني";

const GREETING_AR: &str = "مرحباً! 👋\nكيف يمكنني مساعدتك اليوم؟";

const GREETING_EN: &str = "Hello! 👋\nHow can I help you today?";

const BUILTIN_COMMANDS: &[(&str, &str)] = &[
    ("help", HELP_RESPONSE),
    ("مساعدة", HELP_RESPONSE),
    ("حالة", "✅ حالة النظام تعمل بشكل طبيعي"),
    ("status", "✅ All systems are operating normally"),
    (
        "طلب",
        "📝 لإنشاء طلب جديد، يرجى زيارة:\nhttps://your-site.com/orders/new\nأو تواصل معنا على الرقم: ٠٥٠٠٠٠٠٠٠٠",
    ),
    (
        "معلومات",
        "🤖 هذا نظام آلي للرد على رسائل واتساب\n🔄 الإصدار: 2.0\n📅 تاريخ التحديث: 2024",
    ),
    (
        "دعم",
        "📞 للدعم الفني:\nالهاتف: ٠٥٠٠٠٠٠٠٠٠\nالبريد: support@your-site.com\nالموقع: https://your-site.com/support",
    ),
    ("مرحبا", GREETING_AR),
    ("السلام عليكم", "وعليكم السلام ورحمة الله 🌷\nكيف يمكنني مساعدتك؟"),
    ("hello", GREETING_EN),
    ("hi", GREETING_EN),
];

pub const DEFAULT_RESPONSE: &str = "📱 شكراً لتواصلك معنا!

للحصول على المساعدة، يمكنك استخدام إحدى الأوامر التالية:
• \"حالة\" - لعرض حالة النظام
• \"طلب\" - لإنشاء طلب جديد
• \"معلومات\" - لمعلومات عن الخدمة
• \"دعم\" - للاتصال بالدعم الفني

Thanks for reaching out! Send \"help\" to see the available commands.

أو تواصل معنا مباشرة على:
📞 ٠٥٠٠٠٠٠٠٠٠
✉️ info@your-site.com";
