use super::identity::RawNotification;

/// Longest codes first so `:-)` wins over `:)`.
const SMILEYS: &[(&str, &str)] = &[
    (":-)", "\u{1F642}"),
    (":)", "\u{1F642}"),
    (":-(", "\u{1F641}"),
    (":(", "\u{1F641}"),
    (";-)", "\u{1F609}"),
    (";)", "\u{1F609}"),
    (":-D", "\u{1F600}"),
    (":D", "\u{1F600}"),
    (":-P", "\u{1F61B}"),
    (":P", "\u{1F61B}"),
    (":'(", "\u{1F622}"),
    (":-O", "\u{1F62E}"),
    ("<3", "\u{2764}"),
];

/// Replaces emoticon codes with their emoji.
pub fn add_smileys(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'scan: while !rest.is_empty() {
        for (code, emoji) in SMILEYS {
            if let Some(tail) = rest.strip_prefix(code) {
                out.push_str(emoji);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

fn non_empty(text: Option<&String>) -> Option<String> {
    text.map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Displayable text of a notification.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TextFields {
    pub title: Option<String>,
    pub title_big: Option<String>,
    pub message: Option<String>,
    pub message_big: Option<String>,
    pub message_lines: Vec<String>,
    pub info: Option<String>,
    pub sub: Option<String>,
    pub summary: Option<String>,
}

impl TextFields {
    fn extract(raw: &RawNotification) -> Self {
        let message_lines: Vec<String> = raw
            .text_lines
            .iter()
            .filter_map(|line| non_empty(Some(line)))
            .collect();
        let message_big = non_empty(raw.big_text.as_ref());
        let message = non_empty(raw.text.as_ref())
            .or_else(|| message_big.clone())
            .or_else(|| message_lines.first().cloned());
        let title = non_empty(raw.title.as_ref());
        Self {
            title_big: non_empty(raw.title_big.as_ref()).or_else(|| title.clone()),
            title,
            message,
            message_big,
            message_lines,
            info: non_empty(raw.info_text.as_ref()),
            sub: non_empty(raw.sub_text.as_ref()),
            summary: non_empty(raw.summary_text.as_ref()),
        }
    }
}

/// Extracted text together with the untouched originals that every
/// reformatting pass starts from.
#[derive(Clone, Debug, Default)]
pub struct NotificationText {
    origin: TextFields,
    shown: TextFields,
    emoticons: bool,
}

impl NotificationText {
    pub fn extract(raw: &RawNotification, emoticons: bool) -> Self {
        let origin = TextFields::extract(raw);
        let mut text = Self {
            shown: origin.clone(),
            origin,
            emoticons,
        };
        text.reformat();
        text
    }

    pub const fn fields(&self) -> &TextFields {
        &self.shown
    }

    pub const fn emoticons_enabled(&self) -> bool {
        self.emoticons
    }

    /// Returns whether anything changed.
    pub fn set_emoticons_enabled(&mut self, enabled: bool) -> bool {
        if self.emoticons == enabled {
            return false;
        }
        self.emoticons = enabled;
        self.reformat();
        true
    }

    fn reformat(&mut self) {
        let emoticons = self.emoticons;
        let format = |text: &str| {
            if emoticons {
                add_smileys(text)
            } else {
                text.to_string()
            }
        };
        self.shown.message = self.origin.message.as_deref().map(format);
        self.shown.message_big = self.origin.message_big.as_deref().map(format);
        self.shown.message_lines = self.origin.message_lines.iter().map(|line| format(line)).collect();
    }
}
