use std::{
    env::{self, VarError},
    thread::JoinHandle,
    time::Duration,
};

pub const NET_CONNECT_TIMEOUT: Duration = Duration::from_millis(8 * 1000);

pub const NET_IO_TIMEOUT: Duration = Duration::from_millis(16 * 1000);

const PROXY_ENV_VAR: &str = "HTTPS_PROXY";

pub fn default_ureq_agent_builder(
    proxy_url: Option<&str>,
) -> ureq::config::ConfigBuilder<ureq::typestate::AgentScope> {
    let mut agent = ureq::Agent::config_builder()
        .timeout_global(Some(NET_CONNECT_TIMEOUT + NET_IO_TIMEOUT))
        .timeout_connect(Some(NET_CONNECT_TIMEOUT))
        .timeout_recv_response(Some(NET_IO_TIMEOUT))
        .timeout_send_request(Some(NET_IO_TIMEOUT));

    if let Some(proxy_url) = proxy_url {
        let proxy = ureq::Proxy::new(proxy_url).ok();
        if proxy.is_none() {
            log::warn!("ignoring invalid proxy URL {:?}", proxy_url);
        }
        agent = agent.proxy(proxy);
    }

    agent
}

pub fn proxy_from_env() -> Option<String> {
    env::var(PROXY_ENV_VAR).map_or_else(
        |err| match err {
            VarError::NotPresent => None,
            VarError::NotUnicode(_) => {
                log::error!("proxy URL is not a valid unicode");
                None
            }
        },
        Some,
    )
}

/// Wait for a worker thread, logging instead of propagating a panic.
pub fn join_worker(worker: JoinHandle<()>, name: &str) {
    if let Err(err) = worker.join() {
        log::error!("{} thread panicked: {:?}", name, err);
    }
}
