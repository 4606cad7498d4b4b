use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};

use anyhow::Context;
use meter_core::Reading;

use crate::config::{API_PATH, HTTP_CONNECT_TIMEOUT, HTTP_IO_TIMEOUT};

/// Куда уходят разобранные показания
pub(crate) trait ReadingSink {
    fn send(&mut self, reading: &Reading) -> anyhow::Result<()>;
}

/// POST http://HOST/meterdata с JSON показаний.
///
/// Каждое показание - отдельное соединение (`Connection: close`),
/// счётчик шлёт телеграмму раз в секунду, держать keep-alive незачем.
pub(crate) struct HttpSink {
    addr: SocketAddr,
    host: String,
}

impl HttpSink {
    pub(crate) fn new(addr: SocketAddr, host: impl Into<String>) -> Self {
        Self {
            addr,
            host: host.into(),
        }
    }
}

impl ReadingSink for HttpSink {
    fn send(&mut self, reading: &Reading) -> anyhow::Result<()> {
        let body = reading.to_json()?;
        post_json(self.addr, &self.host, API_PATH, &body)
    }
}

fn post_json(addr: SocketAddr, host: &str, path: &str, body: &[u8]) -> anyhow::Result<()> {
    let mut stream = TcpStream::connect_timeout(&addr, HTTP_CONNECT_TIMEOUT)
        .with_context(|| format!("connect to api {addr}"))?;

    stream.set_nodelay(true).ok();
    stream.set_read_timeout(Some(HTTP_IO_TIMEOUT)).ok();
    stream.set_write_timeout(Some(HTTP_IO_TIMEOUT)).ok();

    // отправляем запрос
    let head = format!(
        "POST {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()?;

    // обрабатываем ответ: нужна только статусная строка
    let mut reader = BufReader::new(&mut stream);
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;

    if n == 0 {
        anyhow::bail!("api closed connection without response");
    }

    let status = parse_status_line(&line)?;
    if status != 200 {
        anyhow::bail!("received status code {status} from API");
    }

    Ok(())
}

fn parse_status_line(line: &str) -> anyhow::Result<u16> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let mut parts = line.split_whitespace();

    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/") {
        anyhow::bail!("unexpected api response: {:?}", line);
    }

    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .with_context(|| format!("bad status line: {line:?}"))
}
