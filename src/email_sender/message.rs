use lettre::address::Envelope;
use lettre::message::header::{self, ContentType};
use lettre::message::{Attachment, Mailbox, Mailboxes, MultiPart, SinglePart};
use lettre::Message;
use log::debug;

use super::MailError;
use crate::calendar::CalendarDocument;

pub const ATTACHMENT_NAME: &str = "reminder.ics";
const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";

pub fn subject(message: &str) -> String {
    format!("Calendar reminder: {}", message)
}

pub fn preamble(message: &str, program: &str) -> String {
    format!(
        "Calendar invitation for reminder: {}.\n     Created by script: {}",
        message, program
    )
}

/// Splits strictly on `,`. Each entry may still be `Name <addr>` or padded
/// with spaces; `build_message` extracts the bare address.
pub fn split_recipients(to: &str) -> Vec<&str> {
    to.split(',').collect()
}

/// Assembles the multipart mail carrying `document` as an attachment.
///
/// `message` is the text given on the command line; subject and preamble
/// use it for every mail, including the halfway reminder.
///
/// The `To:` header carries `to` verbatim while the SMTP envelope gets one
/// recipient per comma separated entry.
pub fn build_message(
    document: &CalendarDocument,
    message: &str,
    sender: &str,
    to: &str,
    program: &str,
) -> Result<Message, MailError> {
    let from: Mailbox = sender.parse()?;
    let to_header: Mailboxes = to.parse()?;
    let recipients = split_recipients(to)
        .into_iter()
        .map(|entry| entry.parse::<Mailbox>().map(|mailbox| mailbox.email))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Envelope recipients: {:?}", recipients);

    let envelope = Envelope::new(Some(from.email.clone()), recipients)?;
    let calendar_type = ContentType::parse(CALENDAR_CONTENT_TYPE)?;

    let body = MultiPart::mixed()
        .singlepart(SinglePart::plain(preamble(message, program)))
        .singlepart(
            Attachment::new(ATTACHMENT_NAME.to_string())
                .body(document.to_ical().to_string(), calendar_type),
        );

    let message = Message::builder()
        .from(from)
        .header(header::To::from(to_header))
        .subject(subject(message))
        .envelope(envelope)
        .multipart(body)?;
    Ok(message)
}
