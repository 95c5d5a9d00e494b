use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new("(https?://[a-zA-Z0-9\\-]+\\.[a-zA-Z0-9\\-._~:/?#\\[\\]@!$&'()*+,;=%]+)")
        .unwrap()
});

fn is_valid_hex(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColorCode {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
    Obfuscated,
    Bold,
    Strikethrough,
    Underline,
    Italic,
    Reset,
}

impl ColorCode {
    /// Parses a legacy `&x` code character.
    fn parse_legacy(code: char) -> Option<ColorCode> {
        Some(match code.to_ascii_lowercase() {
            '0' => ColorCode::Black,
            '1' => ColorCode::DarkBlue,
            '2' => ColorCode::DarkGreen,
            '3' => ColorCode::DarkAqua,
            '4' => ColorCode::DarkRed,
            '5' => ColorCode::DarkPurple,
            '6' => ColorCode::Gold,
            '7' => ColorCode::Gray,
            '8' => ColorCode::DarkGray,
            '9' => ColorCode::Blue,
            'a' => ColorCode::Green,
            'b' => ColorCode::Aqua,
            'c' => ColorCode::Red,
            'd' => ColorCode::LightPurple,
            'e' => ColorCode::Yellow,
            'f' => ColorCode::White,
            'k' => ColorCode::Obfuscated,
            'l' => ColorCode::Bold,
            'm' => ColorCode::Strikethrough,
            'n' => ColorCode::Underline,
            'o' => ColorCode::Italic,
            'r' => ColorCode::Reset,
            _ => return None,
        })
    }

    /// Parses a markup tag name such as `dark_gray` or `b`.
    fn parse_tag(name: &str) -> Option<ColorCode> {
        Some(match name.to_ascii_lowercase().as_str() {
            "black" => ColorCode::Black,
            "dark_blue" => ColorCode::DarkBlue,
            "dark_green" => ColorCode::DarkGreen,
            "dark_aqua" => ColorCode::DarkAqua,
            "dark_red" => ColorCode::DarkRed,
            "dark_purple" => ColorCode::DarkPurple,
            "gold" => ColorCode::Gold,
            "gray" | "grey" => ColorCode::Gray,
            "dark_gray" | "dark_grey" => ColorCode::DarkGray,
            "blue" => ColorCode::Blue,
            "green" => ColorCode::Green,
            "aqua" => ColorCode::Aqua,
            "red" => ColorCode::Red,
            "light_purple" => ColorCode::LightPurple,
            "yellow" => ColorCode::Yellow,
            "white" => ColorCode::White,
            "obfuscated" | "obf" => ColorCode::Obfuscated,
            "bold" | "b" => ColorCode::Bold,
            "strikethrough" | "st" => ColorCode::Strikethrough,
            "underlined" | "u" => ColorCode::Underline,
            "italic" | "i" | "em" => ColorCode::Italic,
            "reset" => ColorCode::Reset,
            _ => return None,
        })
    }

    fn is_formatting(self) -> bool {
        use ColorCode::*;
        matches!(
            self,
            Obfuscated | Bold | Strikethrough | Underline | Italic | Reset
        )
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TextColor {
    Hex(String),
    ColorCode(ColorCode),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum ClickEventType {
    OpenUrl,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    action: ClickEventType,
    value: String,
}

/// This is only used for `TextComponent` serialize
#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(field: &bool) -> bool {
    !*field
}

pub struct TextComponentBuilder {
    component: TextComponent,
}

impl TextComponentBuilder {
    pub fn new(text: String) -> Self {
        let component = TextComponent {
            text,
            ..Default::default()
        };
        Self { component }
    }

    pub fn color_code(mut self, color: ColorCode) -> Self {
        self.component.color = Some(TextColor::ColorCode(color));
        self
    }

    pub fn finish(self) -> TextComponent {
        self.component
    }
}

#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub underlined: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub obfuscated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<TextColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "clickEvent")]
    pub click_event: Option<ClickEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<TextComponent>,
}

/// Style state shared by the legacy and markup parsers.
#[derive(Default, Clone)]
struct Style {
    color: Option<TextColor>,
    bold: bool,
    italic: bool,
    underlined: bool,
    strikethrough: bool,
    obfuscated: bool,
}

impl Style {
    fn set(&mut self, code: ColorCode, val: bool) {
        match code {
            ColorCode::Bold => self.bold = val,
            ColorCode::Italic => self.italic = val,
            ColorCode::Underline => self.underlined = val,
            ColorCode::Strikethrough => self.strikethrough = val,
            ColorCode::Obfuscated => self.obfuscated = val,
            ColorCode::Reset => *self = Style::default(),
            color => {
                if val {
                    self.color = Some(TextColor::ColorCode(color));
                } else {
                    self.color = None;
                }
            }
        }
    }

    fn component(&self, text: String) -> TextComponent {
        TextComponent {
            text,
            bold: self.bold,
            italic: self.italic,
            underlined: self.underlined,
            strikethrough: self.strikethrough,
            obfuscated: self.obfuscated,
            color: self.color.clone(),
            ..Default::default()
        }
    }
}

/// Accumulates text runs, starting a new component whenever the style changes.
struct Builder {
    components: Vec<TextComponent>,
    text: String,
    style: Style,
}

impl Builder {
    fn new() -> Self {
        Self {
            components: Vec::new(),
            text: String::new(),
            style: Style::default(),
        }
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.components.push(self.style.component(text));
        }
    }

    fn restyle(&mut self, f: impl FnOnce(&mut Style)) {
        self.flush();
        f(&mut self.style);
    }

    /// Appends `text`, applying any legacy `&x` codes in it.
    fn push_legacy(&mut self, text: &str) {
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '&' {
                if let Some(color) = chars.peek().copied().and_then(ColorCode::parse_legacy) {
                    chars.next();
                    self.restyle(|style| {
                        if !color.is_formatting() {
                            // A color code clears any formatting before it
                            *style = Style::default();
                        }
                        style.set(color, true);
                    });
                    continue;
                }
            }
            self.text.push(c);
        }
    }

    fn finish(mut self) -> Vec<TextComponent> {
        self.flush();
        link_urls(self.components)
    }
}

impl TextComponent {
    pub fn from_legacy_text(message: &str) -> Vec<TextComponent> {
        let mut builder = Builder::new();
        builder.push_legacy(message);
        builder.finish()
    }

    /// Parses MiniMessage style markup: `<red>`, `<bold>`, `</bold>`, `<#ff00aa>`, `<reset>`.
    ///
    /// Unknown tags are kept as literal text. Legacy `&` codes between tags are applied too.
    pub fn from_markup(message: &str) -> Vec<TextComponent> {
        let mut builder = Builder::new();

        let mut rest = message;
        while let Some(start) = rest.find('<') {
            builder.push_legacy(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find('>') else {
                builder.push_legacy(&rest[start..]);
                rest = "";
                break;
            };
            let tag = &after[..end];
            if !apply_tag(&mut builder, tag) {
                builder.text.push('<');
                builder.text.push_str(tag);
                builder.text.push('>');
            }
            rest = &after[end + 1..];
        }
        builder.push_legacy(rest);

        builder.finish()
    }

    /// Parses chat text that may mix markup tags and legacy `&` codes.
    pub fn parse(message: &str) -> Vec<TextComponent> {
        TextComponent::from_markup(message)
    }

    /// Joins a list of components into a single root component.
    pub fn join(mut components: Vec<TextComponent>) -> TextComponent {
        match components.len() {
            0 => TextComponent::default(),
            1 => components.remove(0),
            _ => TextComponent {
                extra: components,
                ..Default::default()
            },
        }
    }

    /// The text without any styling, including all `extra` children.
    pub fn plain_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.extra {
            out.push_str(&child.plain_text());
        }
        out
    }

    pub fn encode_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn is_text_only(&self) -> bool {
        !self.bold
            && !self.italic
            && !self.underlined
            && !self.strikethrough
            && !self.obfuscated
            && self.color.is_none()
            && self.click_event.is_none()
    }
}

/// Returns false if `tag` is not a recognized tag.
fn apply_tag(builder: &mut Builder, tag: &str) -> bool {
    if let Some(name) = tag.strip_prefix('/') {
        if name.starts_with('#') && is_hex_color(name) {
            builder.restyle(|style| style.color = None);
            return true;
        }
        return match ColorCode::parse_tag(name) {
            Some(ColorCode::Reset) => false,
            Some(code) => {
                builder.restyle(|style| style.set(code, false));
                true
            }
            None => false,
        };
    }

    if is_hex_color(tag) {
        let hex = tag.to_ascii_lowercase();
        builder.restyle(|style| style.color = Some(TextColor::Hex(hex)));
        return true;
    }

    match ColorCode::parse_tag(tag) {
        Some(code) => {
            builder.restyle(|style| style.set(code, true));
            true
        }
        None => false,
    }
}

fn is_hex_color(tag: &str) -> bool {
    tag.len() == 7 && tag.starts_with('#') && tag[1..].chars().all(is_valid_hex)
}

/// Splits out urls into their own components with an open url click action.
fn link_urls(components: Vec<TextComponent>) -> Vec<TextComponent> {
    let mut linked = Vec::with_capacity(components.len());
    for component in components {
        let mut last = 0;
        let text = &component.text;

        for match_ in URL_REGEX.find_iter(text) {
            let index = match_.start();
            let matched = match_.as_str();
            if last != index {
                let mut new = component.clone();
                new.text = String::from(&text[last..index]);
                linked.push(new);
            }
            let mut new = component.clone();
            new.text = matched.to_string();
            new.click_event = Some(ClickEvent {
                action: ClickEventType::OpenUrl,
                value: matched.to_string(),
            });
            linked.push(new);
            last = index + matched.len();
        }
        if last < text.len() {
            let mut new = component.clone();
            new.text = String::from(&text[last..]);
            linked.push(new);
        }
    }
    linked
}

impl<S> From<S> for TextComponent
where
    S: Into<String>,
{
    fn from(value: S) -> Self {
        TextComponent {
            text: value.into(),
            ..Default::default()
        }
    }
}
