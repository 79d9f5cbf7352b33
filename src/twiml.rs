//! Voice markup returned from the call webhook.

use std::io::{Cursor, Write};

use bon::Builder;
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::prelude::*;

const UNABLE_TO_REDIRECT: &str = "Sorry, I was unable to redirect you. Goodbye.";

/// `<Record>` verb settings.
#[derive(Clone, Debug, Eq, PartialEq, Builder)]
pub struct Record {
    #[builder(into)]
    finish_on_key: String,

    /// Maximum recording length in seconds.
    max_length: u32,

    /// Seconds of silence after which the recording ends.
    timeout: u32,

    transcribe: bool,

    /// Where the provider posts the transcription.
    #[builder(into)]
    transcribe_callback: String,
}

enum Verb<'a> {
    Dial(&'a str),
    Say(&'a str),
    Record(&'a Record),
}

impl Verb<'_> {
    fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result {
        match self {
            Self::Dial(number) => write_text_element(writer, "Dial", number),
            Self::Say(message) => write_text_element(writer, "Say", message),
            Self::Record(record) => {
                let mut element = BytesStart::new("Record");
                element.push_attribute(("finishOnKey", record.finish_on_key.as_str()));
                element.push_attribute(("maxLength", record.max_length.to_string().as_str()));
                element.push_attribute(("timeout", record.timeout.to_string().as_str()));
                let transcribe = if record.transcribe { "true" } else { "false" };
                element.push_attribute(("transcribe", transcribe));
                element.push_attribute(("transcribeCallback", record.transcribe_callback.as_str()));
                writer.write_event(Event::Empty(element))?;
                Ok(())
            }
        }
    }
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[must_use]
pub struct VoiceResponse<'a>(Vec<Verb<'a>>);

impl<'a> VoiceResponse<'a> {
    /// Connect the caller to `number`, apologise if that fails.
    pub fn forward(number: &'a str) -> Self {
        Self(vec![Verb::Dial(number), Verb::Say(UNABLE_TO_REDIRECT)])
    }

    /// Record a voice message.
    pub fn voicemail(record: &'a Record) -> Self {
        Self(vec![Verb::Record(record)])
    }

    pub fn render(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("Response")))?;
        for verb in &self.0 {
            verb.write(&mut writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Response")))?;
        String::from_utf8(writer.into_inner().into_inner()).context("the markup is not valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_ok() -> Result {
        let markup = VoiceResponse::forward("+31201234567").render()?;
        assert_eq!(
            markup,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#,
                "<Dial>+31201234567</Dial>",
                "<Say>Sorry, I was unable to redirect you. Goodbye.</Say>",
                "</Response>",
            ),
        );
        Ok(())
    }

    #[test]
    fn test_voicemail_ok() -> Result {
        let record = Record::builder()
            .finish_on_key("#")
            .max_length(300)
            .timeout(10)
            .transcribe(true)
            .transcribe_callback("/sms")
            .build();
        let markup = VoiceResponse::voicemail(&record).render()?;
        assert_eq!(
            markup,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#,
                r##"<Record finishOnKey="#" maxLength="300" timeout="10" "##,
                r#"transcribe="true" transcribeCallback="/sms"/>"#,
                "</Response>",
            ),
        );
        Ok(())
    }

    #[test]
    fn test_text_is_escaped() -> Result {
        let markup = VoiceResponse::forward("<Hangup/>").render()?;
        assert!(markup.contains("<Dial>&lt;Hangup/&gt;</Dial>"));
        Ok(())
    }
}
