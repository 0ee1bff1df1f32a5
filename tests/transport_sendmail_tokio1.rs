#[cfg(test)]
#[cfg(all(unix, feature = "tokio1"))]
mod test {
    use std::{
        env::temp_dir,
        fs,
        sync::{Arc, Mutex},
    };

    use mailhog_sendmail::{
        AsyncSendmailTransport, AsyncTransport, Envelope, Event, StubTransport, Transport,
    };
    use pretty_assertions::assert_eq;
    use tokio1_crate as tokio;

    fn envelope() -> Envelope {
        Envelope::parse(Some("nobody@domain.tld"), ["hei@domain.tld"]).unwrap()
    }

    #[tokio::test]
    async fn sendmail_transport_tokio1() {
        let path = temp_dir().join(format!("mailhog-sendmail-tokio1-{}", std::process::id()));
        let sender = AsyncSendmailTransport::new(format!(
            r#"sh -c 'cat > "$0"' {}"#,
            path.display()
        ));

        let mut chunks = vec![
            b"Subject: Happy new year\r\n\r\n".to_vec(),
            b".".to_vec(),
            b"Be happy!\r".to_vec(),
            b"\n".to_vec(),
        ]
        .into_iter();
        let result = sender.send_chunks(&envelope(), &mut chunks).await;
        let written = fs::read_to_string(&path);
        let _ = fs::remove_file(&path);

        result.unwrap();
        assert_eq!(written.unwrap(), "Subject: Happy new year\n\n..Be happy!\n");
    }

    #[tokio::test]
    async fn sendmail_transport_tokio1_non_zero_exit() {
        let sender = AsyncSendmailTransport::new("sh -c 'cat > /dev/null; exit 75'");

        let err = sender.send_raw(&envelope(), b"Be happy!").await.unwrap_err();

        assert!(err.is_exit());
        assert_eq!(err.status(), Some(75));
    }

    #[tokio::test]
    async fn sendmail_transport_tokio1_broken_pipe() {
        let sender = AsyncSendmailTransport::new("sh -c 'exit 0'");
        let email = vec![b'a'; 4 * 1024 * 1024];

        let err = sender.send_raw(&envelope(), &email).await.unwrap_err();

        assert!(err.is_write());
    }

    #[tokio::test]
    async fn sendmail_transport_tokio1_chatty_child() {
        // echoes a message larger than any pipe buffer back on stderr
        let sender = AsyncSendmailTransport::new("sh -c 'cat >&2; exit 0'");
        let email = vec![b'a'; 1024 * 1024];

        sender.send_raw(&envelope(), &email).await.unwrap();
    }

    #[tokio::test]
    async fn sendmail_transport_tokio1_exits_before_reading() {
        let sender = AsyncSendmailTransport::new(
            r#"sh -c 'echo "unknown flag --smtp-addr" >&2; exit 64'"#,
        );
        let email = vec![b'a'; 1024 * 1024];

        let err = sender.send_raw(&envelope(), &email).await.unwrap_err();

        assert!(err.is_exit());
        assert_eq!(err.status(), Some(64));
        assert_eq!(
            err.to_string(),
            "process exited with status 64: unknown flag --smtp-addr"
        );
    }

    #[tokio::test]
    async fn sendmail_transport_tokio1_listener() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&events);
        let sender = AsyncSendmailTransport::new("sh -c 'cat > /dev/null; exit 1'").with_listener(
            move |event: &Event<'_>| log.lock().unwrap().push(event.to_string()),
        );

        assert!(sender.send_raw(&envelope(), b"Be happy!").await.is_err());

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "email transport \"process://sendmail\" starting".to_owned(),
                "email transport \"process://sendmail\" stopped with an error".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn delegated_transport_tokio1_error() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&events);
        let sender = AsyncSendmailTransport::delegated(StubTransport::new_error())
            .with_listener(move |event: &Event<'_>| {
                log.lock().unwrap().push(event.to_string())
            })
            .notify_delegated(true);

        let err = sender.send_raw(&envelope(), b"Be happy!").await.unwrap_err();
        let expected = Transport::send_raw(&StubTransport::new_error(), &envelope(), b"Be happy!")
            .unwrap_err();

        assert!(err.is_client());
        assert_eq!(err.to_string(), expected.to_string());
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "email transport \"stub://\" starting".to_owned(),
                "email transport \"stub://\" stopped with an error".to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn delegated_transport_tokio1_is_silent_by_default() {
        let events = Arc::new(Mutex::new(0));
        let count = Arc::clone(&events);
        let sender = AsyncSendmailTransport::delegated(StubTransport::new_ok())
            .with_listener(move |_: &Event<'_>| *count.lock().unwrap() += 1);

        sender.send_raw(&envelope(), b"Be happy!").await.unwrap();

        assert_eq!(*events.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn delegated_transport_tokio1() {
        let stub = StubTransport::new_ok().with_identifier("smtp://relay:25");
        let sender = AsyncSendmailTransport::delegated(stub.clone());

        assert_eq!(sender.identify(), "smtp://relay:25");
        sender.send_raw(&envelope(), b"A\r\n.\r\n").await.unwrap();

        assert_eq!(stub.messages(), vec![(envelope(), "A\r\n.\r\n".to_owned())]);
    }
}
