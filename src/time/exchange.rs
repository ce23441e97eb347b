use std::sync::OnceLock;

use tracing::{debug, warn};

use super::{Timestamp, NS_PER_MS};
use crate::core::{Error, Result};
use crate::protocol::TimingMessage;

/// Frozen outputs of one analyzed exchange.
#[derive(Debug, Clone, Default)]
struct Details {
    delay: Option<i64>,
    offset: Option<i64>,
    notes: Vec<String>,
}

impl Details {
    /// Records a degraded-input note (unset timestamp fields).
    fn note(&mut self, text: &str) {
        debug!("{}", text);
        self.notes.push(text.to_string());
    }

    /// Records an impossible-ordering note (server or client clock skew).
    fn anomaly(&mut self, text: &str) {
        warn!("{}", text);
        self.notes.push(text.to_string());
    }
}

/// Round-trip delay and clock offset derived from one NTP request/reply
/// exchange.
///
/// Holds the server's reply message (origin T1, receive T2, transmit T3) and
/// the locally captured destination timestamp (T4). Per RFC-1305, assuming
/// symmetric network transit:
///
/// ```text
/// roundtrip delay = (T4 - T1) - (T3 - T2)
/// clock offset    = ((T2 - T1) + (T3 - T4)) / 2
/// ```
///
/// A positive offset means the local clock is behind the remote clock.
///
/// Delay and offset are computed at most once per instance, on first access
/// or via [`compute_details`]; the computation itself never fails. Degenerate
/// inputs -- unset timestamp fields as sent by broadcast-mode or malformed
/// servers, orderings that would require time travel -- downgrade to absent
/// outputs plus diagnostic [`notes`]. Callers decide reliability from the
/// notes and from which outputs are present.
///
/// [`compute_details`]: ExchangeInfo::compute_details
/// [`notes`]: ExchangeInfo::notes
#[derive(Debug)]
pub struct ExchangeInfo<M> {
    message: M,
    return_time: Timestamp,
    details: OnceLock<Details>,
}

impl<M: TimingMessage> ExchangeInfo<M> {
    /// Creates an uncomputed result from a reply message and the locally
    /// captured destination (T4) timestamp.
    ///
    /// The message is required; `None` is rejected with
    /// [`Error::InvalidArgument`].
    pub fn new(message: Option<M>, return_time: Timestamp) -> Result<Self> {
        let message =
            message.ok_or_else(|| Error::invalid_argument("message cannot be absent"))?;
        Ok(ExchangeInfo {
            message,
            return_time,
            details: OnceLock::new(),
        })
    }

    /// Like [`new`], but computes delay and offset immediately.
    ///
    /// [`new`]: ExchangeInfo::new
    pub fn computed(message: Option<M>, return_time: Timestamp) -> Result<Self> {
        let info = Self::new(message, return_time)?;
        info.compute_details();
        Ok(info)
    }

    /// Computes delay and offset from the four exchange timestamps.
    ///
    /// At most one invocation runs the computation, including under
    /// concurrent first calls; later calls observe the frozen result
    /// unchanged, with no notes appended twice.
    pub fn compute_details(&self) {
        self.details();
    }

    fn details(&self) -> &Details {
        self.details.get_or_init(|| self.analyze())
    }

    fn analyze(&self) -> Details {
        let mut details = Details::default();

        let orig = self.message.originate_timestamp();
        let rcv = self.message.receive_timestamp();
        let xmit = self.message.transmit_timestamp();

        // Arithmetic happens in nanoseconds since the Unix epoch. The
        // unset-field checks must stay on the raw values: raw 0 converts to
        // the 2036 base instant, not to anything sentinel-like.
        let orig_time = orig.to_epoch_nanos();
        let rcv_time = rcv.to_epoch_nanos();
        let xmit_time = xmit.to_epoch_nanos();
        let dest_time = self.return_time.to_epoch_nanos();

        if orig.is_unset() {
            // Likely a broadcast-mode reply that never echoed our request.
            if !xmit.is_unset() {
                details.offset = Some(xmit_time - dest_time);
                details.note("zero origin time -- cannot compute delay");
            } else {
                details.note("zero origin time -- cannot compute delay/offset");
            }
        } else if rcv.is_unset() || xmit.is_unset() {
            details.note("zero receive or transmit time");
            if orig_time > dest_time {
                // A reply cannot precede its own request.
                details.anomaly("origin time > destination time");
            } else {
                // No server processing interval available, so the delay is
                // the bare network travel time.
                details.delay = Some(dest_time - orig_time);
            }
            if !rcv.is_unset() {
                details.offset = Some(rcv_time - orig_time);
            } else if !xmit.is_unset() {
                details.offset = Some(xmit_time - dest_time);
            }
        } else {
            let mut delay_value = dest_time - orig_time;
            if xmit_time < rcv_time {
                // Server claims to have replied before receiving the request;
                // leave the processing interval in the delay.
                details.anomaly("transmit time < receive time");
            } else {
                delay_value -= xmit_time - rcv_time;
            }
            details.delay = Some(delay_value);
            if orig_time > dest_time {
                details.anomaly("origin time > destination time");
            }
            details.offset = Some(
                (((rcv_time - orig_time) as i128 + (xmit_time - dest_time) as i128) / 2) as i64,
            );
        }

        details
    }

    /// Round-trip network delay in nanoseconds, exclusive of server
    /// processing time, or `None` when the inputs did not allow computing it.
    pub fn delay_ns(&self) -> Option<i64> {
        self.details().delay
    }

    /// Clock offset in nanoseconds (positive = local clock behind remote),
    /// or `None` when the inputs did not allow computing it.
    pub fn offset_ns(&self) -> Option<i64> {
        self.details().offset
    }

    /// Round-trip network delay in milliseconds, rounded to nearest with
    /// ties away from zero.
    pub fn delay_ms(&self) -> Option<i64> {
        self.details().delay.map(ns_to_ms)
    }

    /// Clock offset in milliseconds, rounded to nearest with ties away
    /// from zero.
    pub fn offset_ms(&self) -> Option<i64> {
        self.details().offset.map(ns_to_ms)
    }

    /// Diagnostic notes recorded during computation, in append order.
    /// Empty for a clean exchange.
    pub fn notes(&self) -> &[String] {
        &self.details().notes
    }

    /// The reply message this result was derived from.
    pub fn message(&self) -> &M {
        &self.message
    }

    /// The locally captured destination (T4) timestamp.
    pub fn return_time(&self) -> Timestamp {
        self.return_time
    }
}

/// Nanoseconds to milliseconds, rounding to nearest with ties away from zero.
fn ns_to_ms(ns: i64) -> i64 {
    if ns >= 0 {
        (ns + NS_PER_MS / 2) / NS_PER_MS
    } else {
        -((-ns + NS_PER_MS / 2) / NS_PER_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReplyTimestamps;
    use std::sync::Arc;
    use std::thread;

    const UNSET: Timestamp = Timestamp::new(0);

    fn ts(ns: i64) -> Timestamp {
        Timestamp::from_epoch_nanos(ns)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn test_full_exchange() {
        let reply = ReplyTimestamps::new(ts(1_000), ts(1_100), ts(1_200));
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();
        info.compute_details();

        // delay = (1300 - 1000) - (1200 - 1100), offset = ((100) + (-100)) / 2
        assert_eq!(info.delay_ns(), Some(200));
        assert_eq!(info.offset_ns(), Some(0));
        assert!(info.notes().is_empty());
    }

    #[test]
    fn test_zero_origin_with_transmit() {
        init_tracing();
        let reply = ReplyTimestamps::new(UNSET, ts(1_100), ts(1_200));
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        assert_eq!(info.delay_ns(), None);
        assert_eq!(info.offset_ns(), Some(-100));
        assert_eq!(info.notes(), vec!["zero origin time -- cannot compute delay"]);
    }

    #[test]
    fn test_zero_origin_and_transmit() {
        let reply = ReplyTimestamps::new(UNSET, ts(1_100), UNSET);
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        assert_eq!(info.delay_ns(), None);
        assert_eq!(info.offset_ns(), None);
        assert_eq!(
            info.notes(),
            vec!["zero origin time -- cannot compute delay/offset"]
        );
    }

    #[test]
    fn test_zero_transmit_uses_receive_offset() {
        let reply = ReplyTimestamps::new(ts(1_000), ts(1_100), UNSET);
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        assert_eq!(info.delay_ns(), Some(300));
        assert_eq!(info.offset_ns(), Some(100));
        assert_eq!(info.notes(), vec!["zero receive or transmit time"]);
    }

    #[test]
    fn test_zero_receive_uses_transmit_offset() {
        let reply = ReplyTimestamps::new(ts(1_000), UNSET, ts(1_200));
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        assert_eq!(info.delay_ns(), Some(300));
        assert_eq!(info.offset_ns(), Some(-100));
        assert_eq!(info.notes(), vec!["zero receive or transmit time"]);
    }

    #[test]
    fn test_origin_after_destination_degenerate() {
        init_tracing();
        let reply = ReplyTimestamps::new(ts(2_000), UNSET, ts(1_200));
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        assert_eq!(info.delay_ns(), None);
        assert_eq!(info.offset_ns(), Some(-100));
        assert_eq!(
            info.notes(),
            vec![
                "zero receive or transmit time",
                "origin time > destination time"
            ]
        );
    }

    #[test]
    fn test_transmit_before_receive_leaves_delay_uncorrected() {
        let reply = ReplyTimestamps::new(ts(1_000), ts(1_200), ts(1_100));
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        // no processing-time subtraction applied
        assert_eq!(info.delay_ns(), Some(300));
        assert_eq!(info.notes(), vec!["transmit time < receive time"]);
        // offset is still computed from the skewed values
        assert_eq!(info.offset_ns(), Some(0));
    }

    #[test]
    fn test_origin_after_destination_full_case() {
        let reply = ReplyTimestamps::new(ts(1_400), ts(1_100), ts(1_200));
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        // anomaly is recorded but the computation proceeds
        assert_eq!(info.delay_ns(), Some(-200));
        assert_eq!(info.offset_ns(), Some(-200));
        assert_eq!(info.notes(), vec!["origin time > destination time"]);
    }

    #[test]
    fn test_absent_message_rejected() {
        let err = ExchangeInfo::<ReplyTimestamps>::new(None, ts(1_300)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_recompute_is_noop() {
        let reply = ReplyTimestamps::new(UNSET, ts(1_100), ts(1_200));
        let info = ExchangeInfo::computed(Some(reply), ts(1_300)).unwrap();
        let first = info.notes().to_vec();

        info.compute_details();
        info.compute_details();

        assert_eq!(info.notes(), first);
        assert_eq!(info.notes().len(), 1);
        assert_eq!(info.offset_ns(), Some(-100));
    }

    #[test]
    fn test_concurrent_first_computation() {
        let reply = ReplyTimestamps::new(UNSET, ts(1_100), ts(1_200));
        let info = Arc::new(ExchangeInfo::new(Some(reply), ts(1_300)).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let info = Arc::clone(&info);
                thread::spawn(move || info.compute_details())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(info.notes().len(), 1);
        assert_eq!(info.offset_ns(), Some(-100));
    }

    #[test]
    fn test_millisecond_rounding_ties_away_from_zero() {
        let reply = ReplyTimestamps::new(ts(0), ts(750_000), ts(750_000));
        let info = ExchangeInfo::new(Some(reply), ts(1_500_000)).unwrap();
        assert_eq!(info.delay_ns(), Some(1_500_000));
        assert_eq!(info.delay_ms(), Some(2));
        assert_eq!(info.offset_ms(), Some(0));

        let reply = ReplyTimestamps::new(ts(0), ts(-1_500_000), ts(-1_499_900));
        let info = ExchangeInfo::new(Some(reply), ts(100)).unwrap();
        assert_eq!(info.offset_ns(), Some(-1_500_000));
        assert_eq!(info.offset_ms(), Some(-2));
    }

    #[test]
    fn test_accessors_expose_inputs() {
        let reply = ReplyTimestamps::new(ts(1_000), ts(1_100), ts(1_200));
        let info = ExchangeInfo::new(Some(reply), ts(1_300)).unwrap();

        assert_eq!(info.message().originate_timestamp(), ts(1_000));
        assert_eq!(info.return_time(), ts(1_300));
    }
}
