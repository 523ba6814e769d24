//! Transport-neutral descriptions of message panels and modals, and their
//! conversion into serenity builders.
//!
//! Dialogues return these values so they can be tested without Discord; the
//! interaction handlers turn them into embeds and components at the edge.

use once_cell::sync::Lazy;
use regex::Regex;
use serenity::builder::{
    CreateComponents, CreateEmbed, CreateInteractionResponseData, CreateMessage,
    EditInteractionResponse, EditMessage,
};
use serenity::model::application::component::{ButtonStyle, InputTextStyle};
use serenity::model::Timestamp;
use serenity::utils::Color;

pub const BLURPLE: u32 = 0x5865F2;
pub const GREEN: u32 = 0x43B581;
pub const YELLOW: u32 = 0xFAA61A;
pub const RED: u32 = 0xF04747;
pub const GREY: u32 = 0x747F8D;
pub const SKY: u32 = 0xA8DADC;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Primary,
    Secondary,
    Success,
    Danger,
}

impl From<ButtonKind> for ButtonStyle {
    fn from(kind: ButtonKind) -> Self {
        match kind {
            ButtonKind::Primary => ButtonStyle::Primary,
            ButtonKind::Secondary => ButtonStyle::Secondary,
            ButtonKind::Success => ButtonStyle::Success,
            ButtonKind::Danger => ButtonStyle::Danger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub custom_id: String,
    pub label: String,
    pub kind: ButtonKind,
    pub disabled: bool,
}

impl ButtonSpec {
    pub fn new(custom_id: &str, label: &str, kind: ButtonKind) -> Self {
        ButtonSpec {
            custom_id: custom_id.to_string(),
            label: label.to_string(),
            kind,
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedSpec {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: Option<String>,
    pub fields: Vec<FieldSpec>,
    pub thumbnail: Option<String>,
    pub image: Option<String>,
}

impl EmbedSpec {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        EmbedSpec {
            title: title.into(),
            description: description.into(),
            color,
            footer: None,
            fields: Vec::new(),
            thumbnail: None,
            image: None,
        }
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn to_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::default();
        embed
            .title(&self.title)
            .color(Color::new(self.color))
            .timestamp(Timestamp::now());

        if !self.description.is_empty() {
            embed.description(&self.description);
        }

        for field in &self.fields {
            embed.field(&field.name, &field.value, field.inline);
        }

        if let Some(ref footer) = self.footer {
            embed.footer(|f| f.text(footer));
        }

        if let Some(ref url) = self.thumbnail {
            embed.thumbnail(url);
        }

        if let Some(ref url) = self.image {
            embed.image(url);
        }

        embed
    }
}

/// A full message body: optional content, optional embed, one row of buttons
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    pub content: Option<String>,
    pub embed: Option<EmbedSpec>,
    pub buttons: Vec<ButtonSpec>,
}

impl Panel {
    /// Plain content, no embed
    pub fn text(content: impl Into<String>) -> Self {
        Panel {
            content: Some(content.into()),
            ..Panel::default()
        }
    }

    pub fn embed(embed: EmbedSpec) -> Self {
        Panel {
            content: None,
            embed: Some(embed),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<ButtonSpec>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn button_ids(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.custom_id.as_str()).collect()
    }

    pub fn embeds(&self) -> Vec<CreateEmbed> {
        self.embed.iter().map(EmbedSpec::to_embed).collect()
    }

    pub fn components(&self) -> CreateComponents {
        button_row(&self.buttons)
    }

    pub fn fill_response<'a, 'b>(
        &self,
        data: &'b mut CreateInteractionResponseData<'a>,
    ) -> &'b mut CreateInteractionResponseData<'a> {
        data.content(self.content.as_deref().unwrap_or(""))
            .set_embeds(self.embeds())
            .set_components(self.components())
    }

    pub fn fill_edit<'b>(&self, edit: &'b mut EditInteractionResponse) -> &'b mut EditInteractionResponse {
        edit.content(self.content.as_deref().unwrap_or(""))
            .set_embeds(self.embeds())
            .set_components(self.components())
    }

    pub fn fill_message_edit<'a, 'b>(&self, edit: &'b mut EditMessage<'a>) -> &'b mut EditMessage<'a> {
        edit.content(self.content.as_deref().unwrap_or(""))
            .set_embeds(self.embeds())
            .set_components(self.components())
    }

    pub fn fill_message<'a, 'b>(&self, message: &'b mut CreateMessage<'a>) -> &'b mut CreateMessage<'a> {
        if let Some(ref content) = self.content {
            message.content(content);
        }
        message.set_embeds(self.embeds()).set_components(self.components())
    }
}

/// Builds a single action row, or no rows at all for an empty slice
pub fn button_row(buttons: &[ButtonSpec]) -> CreateComponents {
    let mut components = CreateComponents::default();
    if buttons.is_empty() {
        return components;
    }

    components.create_action_row(|row| {
        for spec in buttons {
            row.create_button(|button| {
                button
                    .custom_id(&spec.custom_id)
                    .label(&spec.label)
                    .style(spec.kind.into())
                    .disabled(spec.disabled)
            });
        }
        row
    });
    components
}

/// Same buttons, all disabled
pub fn disable_all(buttons: &[ButtonSpec]) -> Vec<ButtonSpec> {
    buttons.iter().cloned().map(ButtonSpec::disabled).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub custom_id: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub paragraph: bool,
    pub required: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

impl InputSpec {
    pub fn short(custom_id: &str, label: impl Into<String>) -> Self {
        InputSpec {
            custom_id: custom_id.to_string(),
            label: label.into(),
            placeholder: None,
            value: None,
            paragraph: false,
            required: true,
            min_length: None,
            max_length: None,
        }
    }

    pub fn paragraph(custom_id: &str, label: impl Into<String>) -> Self {
        InputSpec {
            paragraph: true,
            ..InputSpec::short(custom_id, label)
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn length(mut self, min: u64, max: u64) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalSpec {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<InputSpec>,
}

impl ModalSpec {
    pub fn new(custom_id: &str, title: impl Into<String>, inputs: Vec<InputSpec>) -> Self {
        ModalSpec {
            custom_id: custom_id.to_string(),
            title: title.into(),
            inputs,
        }
    }

    pub fn fill_response<'a, 'b>(
        &self,
        data: &'b mut CreateInteractionResponseData<'a>,
    ) -> &'b mut CreateInteractionResponseData<'a> {
        data.custom_id(&self.custom_id)
            .title(&self.title)
            .set_components(self.components())
    }

    /// One action row per text input, as Discord requires
    pub fn components(&self) -> CreateComponents {
        let mut components = CreateComponents::default();
        for input in &self.inputs {
            components.create_action_row(|row| {
                row.create_input_text(|text| {
                    text.custom_id(&input.custom_id)
                        .label(&input.label)
                        .style(if input.paragraph {
                            InputTextStyle::Paragraph
                        } else {
                            InputTextStyle::Short
                        })
                        .required(input.required);
                    if let Some(ref placeholder) = input.placeholder {
                        text.placeholder(placeholder);
                    }
                    if let Some(ref value) = input.value {
                        text.value(value);
                    }
                    if let Some(min) = input.min_length {
                        text.min_length(min);
                    }
                    if let Some(max) = input.max_length {
                        text.max_length(max);
                    }
                    text
                })
            });
        }
        components
    }
}

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9A-Fa-f]{6})$").expect("Invalid regex"));

/// Parses `#RRGGBB` into a colour value
pub fn parse_hex_color(input: &str) -> Option<u32> {
    let caps = HEX_COLOR.captures(input.trim())?;
    u32::from_str_radix(&caps[1], 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#5865F2"), Some(0x5865F2));
        assert_eq!(parse_hex_color("#a8dadc"), Some(0xA8DADC));
        assert_eq!(parse_hex_color(" #000000 "), Some(0));
        assert_eq!(parse_hex_color("5865F2"), None);
        assert_eq!(parse_hex_color("#5865F"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
        assert_eq!(parse_hex_color("#+12345"), None);
    }

    #[test]
    fn test_disable_all_keeps_ids() {
        let buttons = vec![
            ButtonSpec::new("a", "A", ButtonKind::Primary),
            ButtonSpec::new("b", "B", ButtonKind::Danger),
        ];
        let disabled = disable_all(&buttons);
        assert!(disabled.iter().all(|b| b.disabled));
        assert_eq!(disabled[1].custom_id, "b");
    }

    #[test]
    fn test_panel_button_ids() {
        let panel = Panel::embed(EmbedSpec::new("t", "d", BLURPLE))
            .with_buttons(vec![ButtonSpec::new("x", "X", ButtonKind::Success)]);
        assert_eq!(panel.button_ids(), vec!["x"]);
        assert!(panel.content.is_none());
    }
}
