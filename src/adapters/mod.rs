//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                    | Connects to                  |
//! |------------|-------------------------------|------------------------------|
//! | `lines`    | GateInputs, GateOutputs       | embedded-hal digital pins    |
//! | `time`     | Timebase, WallClock           | esp_timer, RTC, FreeRTOS delay |
//! | `sleep`    | SleepPort                     | ESP-IDF light sleep, GPIO ISR |
//! | `sntp`     | ClockSync                     | WiFi STA + SNTP              |
//! | `nvs`      | ConfigPort                    | NVS / in-memory store        |
//! | `log_sink` | EventSink                     | Serial log output            |
//! | `board`    | all hardware ports            | the adapters above           |

pub mod board;
pub mod lines;
pub mod log_sink;
pub mod nvs;
pub mod sleep;
pub mod sntp;
pub mod time;
