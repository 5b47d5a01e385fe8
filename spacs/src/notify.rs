use crate::config::ServerConfig;
use crate::errors::NotifyError;
use crate::link::Link;
use serde::Serialize;
use std::time::Duration;

/// An event reported to the server. Serializes as
/// `{"status":"enrolled","id":N}` or `{"status":"login","id":N,"confidence":C}`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Event {
    Enrolled { id: u16 },
    Login { id: u16, confidence: u16 },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Enrolled { .. } => "enroll",
            Event::Login { .. } => "login",
        }
    }

    pub fn to_json(&self) -> Result<String, NotifyError> {
        serde_json::to_string(self).map_err(NotifyError::Encode)
    }
}

/// Whatever the server answered. Error statuses count as delivered.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

pub trait Notify {
    fn notify(&mut self, event: &Event) -> Result<Delivery, NotifyError>;
}

/// Posts events as JSON, once, with no retry.
pub struct HttpNotifier {
    agent: ureq::Agent,
    server: ServerConfig,
    link: Box<dyn Link>,
}

impl HttpNotifier {
    pub fn new(server: ServerConfig, link: Box<dyn Link>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(server.timeout_ms))
            .build();

        HttpNotifier {
            agent,
            server,
            link,
        }
    }

    fn url_for(&self, event: &Event) -> String {
        match event {
            Event::Enrolled { .. } => self.server.enroll_url(),
            Event::Login { .. } => self.server.login_url(),
        }
    }
}

impl Notify for HttpNotifier {
    fn notify(&mut self, event: &Event) -> Result<Delivery, NotifyError> {
        if !self.link.is_up() {
            return Err(NotifyError::LinkDown(self.link.name().to_string()));
        }

        let url = self.url_for(event);
        let payload = event.to_json()?;
        log::info!("Sending POST request ({}) to: {}", event.kind(), url);
        log::info!("Payload: {}", payload);

        let response = match self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&payload)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(NotifyError::Transport {
                    url,
                    reason: e.to_string(),
                })
            }
        };

        let status = response.status();
        let body = response.into_string().map_err(NotifyError::Body)?;

        Ok(Delivery { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::AlwaysUp;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    struct Down;

    impl Link for Down {
        fn is_up(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "wlan0"
        }
    }

    #[test]
    fn enrolled_payload_has_status_and_id() {
        let json = Event::Enrolled { id: 4 }.to_json().unwrap();

        assert_eq!(json, r#"{"status":"enrolled","id":4}"#);
    }

    #[test]
    fn login_payload_carries_confidence() {
        let json = Event::Login {
            id: 12,
            confidence: 88,
        }
        .to_json()
        .unwrap();

        assert_eq!(json, r#"{"status":"login","id":12,"confidence":88}"#);
    }

    #[test]
    fn down_link_drops_the_event() {
        let mut notifier = HttpNotifier::new(ServerConfig::default(), Box::new(Down));

        match notifier.notify(&Event::Enrolled { id: 1 }) {
            Err(NotifyError::LinkDown(name)) => assert_eq!(name, "wlan0"),
            other => panic!("unexpected {:?}", other),
        }
    }

    /// Accepts one request, hands back (request line, body) and answers `status`.
    fn one_shot_server(status: &'static str) -> (u16, thread::JoinHandle<(String, String)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                let lower = header.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    length = value.trim().parse().unwrap();
                }
            }
            let mut body = vec![0u8; length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                status
            )
            .unwrap();

            (request_line.trim_end().to_string(), String::from_utf8(body).unwrap())
        });

        (port, handle)
    }

    fn local_server(port: u16) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn login_is_posted_to_login_path() {
        let (port, server) = one_shot_server("200 OK");
        let mut notifier = HttpNotifier::new(local_server(port), Box::new(AlwaysUp));

        let delivery = notifier
            .notify(&Event::Login {
                id: 3,
                confidence: 120,
            })
            .unwrap();
        let (request_line, body) = server.join().unwrap();

        assert_eq!(request_line, "POST /fingerprint_login HTTP/1.1");
        assert_eq!(body, r#"{"status":"login","id":3,"confidence":120}"#);
        assert_eq!(delivery, Delivery { status: 200, body: "ok".to_string() });
    }

    #[test]
    fn server_error_still_counts_as_delivered() {
        let (port, server) = one_shot_server("500 Internal Server Error");
        let mut notifier = HttpNotifier::new(local_server(port), Box::new(AlwaysUp));

        let delivery = notifier.notify(&Event::Enrolled { id: 9 }).unwrap();
        let (request_line, _) = server.join().unwrap();

        assert_eq!(request_line, "POST /fingerprint_enroll HTTP/1.1");
        assert_eq!(delivery.status, 500);
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut notifier = HttpNotifier::new(local_server(port), Box::new(AlwaysUp));

        match notifier.notify(&Event::Enrolled { id: 1 }) {
            Err(NotifyError::Transport { url, .. }) => {
                assert_eq!(url, format!("http://127.0.0.1:{}/fingerprint_enroll", port))
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
