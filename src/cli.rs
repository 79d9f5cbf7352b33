use chrono::Weekday;
use clap::Parser;
use reqwest::Url;

use crate::{
    api::twilio,
    hours::{ConfigError, WeeklyWindow},
    prelude::*,
    twiml::Record,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[clap(long, default_value = "0.0.0.0:8080", env = "BIND_ADDRESS")]
    pub bind_address: String,

    /// Number to forward calls to during business hours, and to text voicemail transcripts to.
    #[clap(long = "forward-number", env = "MY_PHONE_NUMBER")]
    pub forward_number: String,

    /// Sender of transcript messages. Defaults to the caller's number.
    #[clap(long = "sms-from-number", env = "SMS_FROM_NUMBER")]
    pub sms_from_number: Option<String>,

    #[clap(flatten)]
    pub business_hours: BusinessHoursArgs,

    #[clap(flatten)]
    pub voicemail: VoicemailArgs,

    #[clap(flatten)]
    pub twilio: TwilioArgs,
}

#[derive(Copy, Clone, Parser)]
pub struct BusinessHoursArgs {
    #[clap(long = "work-week-start", default_value = "Monday", env = "WORK_WEEK_START")]
    pub week_start: Weekday,

    #[clap(long = "work-week-end", default_value = "Friday", env = "WORK_WEEK_END")]
    pub week_end: Weekday,

    /// Opening hour, 0-23.
    #[clap(long = "work-day-start", default_value = "8", env = "WORK_DAY_START")]
    pub day_start: u32,

    /// Closing hour, 0-23.
    #[clap(long = "work-day-end", default_value = "18", env = "WORK_DAY_END")]
    pub day_end: u32,
}

impl BusinessHoursArgs {
    pub fn window(self) -> Result<WeeklyWindow, ConfigError> {
        WeeklyWindow::try_new(self.week_start, self.week_end, self.day_start, self.day_end)
    }
}

#[derive(Parser)]
pub struct VoicemailArgs {
    /// Key which ends the recording.
    #[clap(long = "voicemail-finish-on-key", default_value = "#", env = "VOICEMAIL_FINISH_ON_KEY")]
    pub finish_on_key: String,

    /// Maximum recording length in seconds.
    #[clap(long = "voicemail-max-length", default_value = "300", env = "VOICEMAIL_MAX_LENGTH")]
    pub max_length: u32,

    /// Seconds of silence which end the recording.
    #[clap(long = "voicemail-timeout", default_value = "10", env = "VOICEMAIL_TIMEOUT")]
    pub timeout: u32,

    /// Path the transcription gets posted to.
    #[clap(long = "transcribe-callback", default_value = "/sms", env = "TRANSCRIBE_CALLBACK")]
    pub transcribe_callback: String,
}

impl VoicemailArgs {
    pub fn record(&self) -> Record {
        Record::builder()
            .finish_on_key(self.finish_on_key.as_str())
            .max_length(self.max_length)
            .timeout(self.timeout)
            .transcribe(true)
            .transcribe_callback(self.transcribe_callback.as_str())
            .build()
    }
}

#[derive(Parser)]
pub struct TwilioArgs {
    #[clap(long = "twilio-account-sid", env = "TWILIO_ACCOUNT_SID")]
    pub account_sid: String,

    #[clap(long = "twilio-auth-token", env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    #[clap(
        long = "twilio-api-base-url",
        default_value = "https://api.twilio.com/",
        env = "TWILIO_API_BASE_URL"
    )]
    pub base_url: Url,
}

impl TwilioArgs {
    pub fn new_client(self) -> Result<twilio::Api> {
        twilio::Api::new(self.account_sid, self.auth_token, self.base_url)
    }
}
