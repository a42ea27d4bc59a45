use candle_core::Device;
use tracing::info;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(dev) => {
                info!("embedding device: metal");
                return dev;
            }
            Err(err) => tracing::warn!(error = %err, "metal unavailable, falling back to cpu"),
        }
    }
    info!("embedding device: cpu");
    Device::Cpu
}
