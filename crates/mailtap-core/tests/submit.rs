//! Message submission against a scripted SMTP server.

#![allow(clippy::unwrap_used)]

use mailtap_core::send::submit;
use mailtap_core::{CredentialRecord, Endpoint, Error, Security, SmtpEndpoint};
use mailtap_smtp::{Address, Client};
use secrecy::SecretString;
use tokio_test::io::Builder;

const MESSAGE: &[u8] = b"Subject: x\r\n\r\nhi\r\n";

fn record() -> CredentialRecord {
    CredentialRecord {
        address: "me@example.com".to_string(),
        password: SecretString::from("secret"),
        imap: Endpoint {
            host: "imap.example.com".to_string(),
            port: 993,
        },
        smtp: SmtpEndpoint {
            endpoint: Endpoint {
                host: "smtp.example.com".to_string(),
                port: 465,
            },
            security: Security::Tls,
        },
    }
}

fn addrs(list: &[&str]) -> Vec<Address> {
    list.iter().map(|a| Address::new(a).unwrap()).collect()
}

#[tokio::test]
async fn test_submit_to_every_recipient() {
    let mock = Builder::new()
        .read(b"220 mx ready\r\n")
        .write(b"EHLO localhost\r\n")
        .read(b"250-mx\r\n250-SIZE 10000\r\n250 AUTH PLAIN\r\n")
        .write(b"AUTH PLAIN AG1lQGV4YW1wbGUuY29tAHNlY3JldA==\r\n")
        .read(b"235 ok\r\n")
        .write(b"MAIL FROM:<me@example.com> SIZE=18\r\n")
        .read(b"250 ok\r\n")
        .write(b"RCPT TO:<a@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"RCPT TO:<b@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go\r\n")
        .write(b"Subject: x\r\n\r\nhi\r\n.\r\n")
        .read(b"250 queued\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 bye\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let record = record();
    submit(
        client,
        &record,
        &Address::new(&record.address).unwrap(),
        &addrs(&["a@example.com", "b@example.com"]),
        MESSAGE,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_auth_failure_names_the_step() {
    let mock = Builder::new()
        .read(b"220 mx ready\r\n")
        .write(b"EHLO localhost\r\n")
        .read(b"250 mx\r\n")
        .write(b"AUTH PLAIN AG1lQGV4YW1wbGUuY29tAHNlY3JldA==\r\n")
        .read(b"535 5.7.8 bad credentials\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let record = record();
    let err = submit(
        client,
        &record,
        &Address::new(&record.address).unwrap(),
        &addrs(&["a@example.com"]),
        MESSAGE,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Send(ref text) if text.starts_with("authentication:")));
    assert!(err.to_string().contains("bad credentials"));
}

#[tokio::test]
async fn test_rejected_recipient_stops_submission() {
    let mock = Builder::new()
        .read(b"220 mx ready\r\n")
        .write(b"EHLO localhost\r\n")
        .read(b"250 mx\r\n")
        .write(b"AUTH PLAIN AG1lQGV4YW1wbGUuY29tAHNlY3JldA==\r\n")
        .read(b"235 ok\r\n")
        .write(b"MAIL FROM:<me@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"RCPT TO:<nobody@example.com>\r\n")
        .read(b"550 5.1.1 no such user\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let record = record();
    let err = submit(
        client,
        &record,
        &Address::new(&record.address).unwrap(),
        &addrs(&["nobody@example.com"]),
        MESSAGE,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Send(ref text) if text.starts_with("RCPT TO:")));
}
