use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// 关闭信号类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM
    Term,

    /// SIGINT - Ctrl+C
    Interrupt,

    /// 手动触发
    Manual,
}

/// 关闭信号发送端
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<Option<ShutdownSignal>>,
}

/// 关闭信号接收端，可克隆
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<Option<ShutdownSignal>>,
}

/// 创建一对关闭句柄
pub fn channel() -> (ShutdownHandle, ShutdownListener) {
    let (tx, rx) = watch::channel(None);
    (ShutdownHandle { tx }, ShutdownListener { rx })
}

impl ShutdownHandle {
    pub fn trigger(&self, signal: ShutdownSignal) {
        info!(?signal, "Shutdown requested");
        self.tx.send_replace(Some(signal));
    }

    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// 等待系统信号并触发关闭
    #[cfg(unix)]
    pub async fn trigger_on_system_signal(&self) -> std::io::Result<ShutdownSignal> {
        use signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let received = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Term,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
        };

        self.trigger(received);
        Ok(received)
    }

    #[cfg(not(unix))]
    pub async fn trigger_on_system_signal(&self) -> std::io::Result<ShutdownSignal> {
        signal::ctrl_c().await?;
        self.trigger(ShutdownSignal::Interrupt);
        Ok(ShutdownSignal::Interrupt)
    }
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// 等待关闭信号；发送端被丢弃时视为手动关闭
    pub async fn wait(&mut self) -> ShutdownSignal {
        loop {
            if let Some(signal) = *self.rx.borrow_and_update() {
                return signal;
            }
            if self.rx.changed().await.is_err() {
                return ShutdownSignal::Manual;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_trigger() {
        let (handle, mut listener) = channel();
        assert!(!listener.is_triggered());

        handle.trigger(ShutdownSignal::Manual);

        assert!(listener.is_triggered());
        assert_eq!(listener.wait().await, ShutdownSignal::Manual);
    }

    #[tokio::test]
    async fn test_multiple_listeners() {
        let (handle, mut first) = channel();
        let mut second = handle.subscribe();

        handle.trigger(ShutdownSignal::Term);

        assert_eq!(first.wait().await, ShutdownSignal::Term);
        assert_eq!(second.wait().await, ShutdownSignal::Term);
    }

    #[tokio::test]
    async fn test_dropped_handle_releases_waiters() {
        let (handle, mut listener) = channel();
        drop(handle);

        assert_eq!(listener.wait().await, ShutdownSignal::Manual);
    }
}
