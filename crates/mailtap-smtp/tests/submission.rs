//! Full submission conversations against scripted servers.

#![allow(clippy::unwrap_used)]

use mailtap_smtp::{Address, Client, Error};
use tokio_test::io::Builder;

fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

#[tokio::test]
async fn test_send_to_two_recipients() {
    let mock = Builder::new()
        .read(b"220 mx.example.com ESMTP\r\n")
        .write(b"EHLO localhost\r\n")
        .read(b"250-mx.example.com\r\n250-SIZE 1000\r\n250 AUTH LOGIN PLAIN\r\n")
        .write(b"AUTH PLAIN AG1lQGV4YW1wbGUuY29tAHNlY3JldA==\r\n")
        .read(b"235 2.7.0 Accepted\r\n")
        .write(b"MAIL FROM:<me@example.com> SIZE=26\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<a@example.com>\r\n")
        .read(b"250 OK\r\n")
        .write(b"RCPT TO:<b@example.com>\r\n")
        .read(b"251 will forward\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go ahead\r\n")
        .write(b"Subject: hi\r\n\r\n..dot\r\n.\r\n")
        .read(b"250 queued as 12345\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 bye\r\n")
        .build();

    let message = b"Subject: hi\n\n.dot\n";

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let client = client.auth_plain("me@example.com", "secret").await.unwrap();
    let client = client.mail_from(&addr("me@example.com"), Some(26)).await.unwrap();
    let client = client.rcpt_to(&addr("a@example.com")).await.unwrap();
    let client = client.rcpt_to(&addr("b@example.com")).await.unwrap();
    let client = client.data().await.unwrap();
    let client = client.send_message(message).await.unwrap();
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_size_omitted_without_extension() {
    let mock = Builder::new()
        .read(b"220 mx ready\r\n")
        .write(b"EHLO localhost\r\n")
        .read(b"250 mx\r\n")
        .write(b"AUTH PLAIN AHUAcA==\r\n")
        .read(b"235 ok\r\n")
        .write(b"MAIL FROM:<u@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"QUIT\r\n")
        .read(b"221 bye\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.ehlo("localhost").await.unwrap();
    let client = client.auth_plain("u", "p").await.unwrap();
    let client = client.mail_from(&addr("u@example.com"), Some(500)).await.unwrap();
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_recipient_rejected() {
    let mock = Builder::new()
        .read(b"220 mx ready\r\n")
        .write(b"AUTH PLAIN AHUAcA==\r\n")
        .read(b"235 ok\r\n")
        .write(b"MAIL FROM:<u@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"RCPT TO:<nobody@example.com>\r\n")
        .read(b"550-5.1.1 The email account that you tried to reach\r\n550 5.1.1 does not exist\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.auth_plain("u", "p").await.unwrap();
    let client = client.mail_from(&addr("u@example.com"), None).await.unwrap();

    let err = client.rcpt_to(&addr("nobody@example.com")).await.unwrap_err();
    match err {
        Error::Rejected { code, message } => {
            assert_eq!(code, 550);
            assert!(message.ends_with("does not exist"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_message_rejected_after_data() {
    let mock = Builder::new()
        .read(b"220 mx ready\r\n")
        .write(b"AUTH PLAIN AHUAcA==\r\n")
        .read(b"235 ok\r\n")
        .write(b"MAIL FROM:<u@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"RCPT TO:<v@example.com>\r\n")
        .read(b"250 ok\r\n")
        .write(b"DATA\r\n")
        .read(b"354 go ahead\r\n")
        .write(b"x\r\n.\r\n")
        .read(b"452 mailbox full\r\n")
        .build();

    let client = Client::from_stream(mock).await.unwrap();
    let client = client.auth_plain("u", "p").await.unwrap();
    let client = client.mail_from(&addr("u@example.com"), None).await.unwrap();
    let client = client.rcpt_to(&addr("v@example.com")).await.unwrap();
    let client = client.data().await.unwrap();

    let err = client.send_message(b"x").await.unwrap_err();
    assert!(err.is_transient());
}
