//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the main loop stalls.  The timeout comes from
//! [`ToyConfig::watchdog_timeout_ms`](crate::config::ToyConfig) and has to
//! cover the longest blocking actuation sequence, since the loop only
//! feeds between ticks.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    #[cfg(not(target_os = "espidf"))]
    feeds: u32,
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the current task.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { timeout_ms, subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): {}ms, no-op", timeout_ms);
            Self { timeout_ms, feeds: 0 }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Feed the watchdog.  Must run at least once per timeout period.
    #[cfg(target_os = "espidf")]
    pub fn feed(&mut self) {
        if self.subscribed {
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&mut self) {
        self.feeds = self.feeds.wrapping_add(1);
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds
    }
}
