use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::config;

/// Meter Reader - читает телеграммы P1-порта счётчика и отправляет показания в smartmeter-api.
///
/// Конвейер перезапускается, если за idle-timeout не пришло ни одной
/// успешно разобранной телеграммы.
#[derive(Parser, Debug, Clone)]
#[command(name = "meter-reader", version, about)]
pub(crate) struct Args {
    /// Адрес smartmeter-api, например 192.168.1.10:8080 (показания уходят на http://HOST/meterdata)
    #[arg(long, env = "API_HOST")]
    pub(crate) api: String,

    /// Последовательный порт счётчика
    #[arg(long, default_value = config::DEFAULT_DEVICE)]
    pub(crate) device: PathBuf,

    /// Скорость порта
    #[arg(long, default_value_t = config::DEFAULT_BAUD)]
    pub(crate) baud: u32,

    /// Сколько секунд ждать успешную телеграмму до перезапуска
    #[arg(
        long,
        default_value_t = config::IDLE_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(crate) idle_timeout_secs: u64,

    /// Пауза перед перезапуском конвейера, секунды
    #[arg(long, default_value_t = config::RESTART_DELAY.as_secs())]
    pub(crate) restart_delay_secs: u64,
}

impl Args {
    /// Валидация аргументов (api выглядит как HOST[:PORT], device не пустой)
    pub(crate) fn validate(&self) -> Result<()> {
        let api = self.api.trim();
        if api.is_empty() {
            bail!("api flag or API_HOST not set");
        }
        if api.contains('/') || api.contains(char::is_whitespace) {
            bail!("--api must look like HOST[:PORT] (got: {})", self.api);
        }
        if self.device.as_os_str().is_empty() {
            bail!("--device is empty");
        }
        Ok(())
    }

    pub(crate) fn api_host(&self) -> &str {
        self.api.trim()
    }

    pub(crate) fn api_url(&self) -> String {
        format!("http://{}{}", self.api_host(), config::API_PATH)
    }

    pub(crate) fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub(crate) fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// Адрес API для TCP: порт по умолчанию 80
    pub(crate) fn api_socket_addr(&self) -> Result<SocketAddr> {
        resolve_api(self.api_host())
    }
}

pub(crate) fn resolve_api(host: &str) -> Result<SocketAddr> {
    let with_port = if has_port(host) {
        host.to_string()
    } else {
        format!("{host}:80")
    };

    // Берём первый результат резолвинга
    with_port
        .to_socket_addrs()
        .with_context(|| format!("resolve api host {host}"))?
        .next()
        .with_context(|| format!("no addresses resolved for {host}"))
}

fn has_port(host: &str) -> bool {
    // [::1]:8080 / [::1] / 127.0.0.1:8080 / localhost
    if let Some(rest) = host.strip_prefix('[') {
        return rest.contains("]:");
    }
    host.rsplit_once(':')
        .is_some_and(|(h, p)| !h.contains(':') && p.parse::<u16>().is_ok())
}
