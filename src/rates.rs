//! Delta computation over monotonic kernel counters.
//!
//! Deltas are computed with unsigned wrapping subtraction and are never
//! clamped. Between two correctly ordered snapshots (newer minus older) of a
//! counter that has not been reset, every field is the elapsed activity. If
//! the operands are swapped, or a counter was reset in between (interface
//! re-created, driver reload), the affected fields wrap around to huge
//! values. Callers that may see resets must check for that themselves.

use crate::model::{Cpu, NetInterface, NetInterfaceList};

/// Field-wise difference between two snapshots of the same shape.
pub trait Delta {
    /// Returns `self - previous` for every counter field.
    ///
    /// Non-counter fields are taken from `self`.
    fn delta(&self, previous: &Self) -> Self;
}

impl Delta for Cpu {
    fn delta(&self, previous: &Self) -> Self {
        Cpu {
            user: self.user.wrapping_sub(previous.user),
            nice: self.nice.wrapping_sub(previous.nice),
            sys: self.sys.wrapping_sub(previous.sys),
            idle: self.idle.wrapping_sub(previous.idle),
            wait: self.wait.wrapping_sub(previous.wait),
            irq: self.irq.wrapping_sub(previous.irq),
            soft_irq: self.soft_irq.wrapping_sub(previous.soft_irq),
            stolen: self.stolen.wrapping_sub(previous.stolen),
        }
    }
}

impl Delta for NetInterface {
    fn delta(&self, previous: &Self) -> Self {
        NetInterface {
            name: self.name.clone(),
            rx_bytes: self.rx_bytes.wrapping_sub(previous.rx_bytes),
            rx_packets: self.rx_packets.wrapping_sub(previous.rx_packets),
            rx_errs: self.rx_errs.wrapping_sub(previous.rx_errs),
            rx_drop: self.rx_drop.wrapping_sub(previous.rx_drop),
            rx_fifo: self.rx_fifo.wrapping_sub(previous.rx_fifo),
            rx_frame: self.rx_frame.wrapping_sub(previous.rx_frame),
            rx_compressed: self.rx_compressed.wrapping_sub(previous.rx_compressed),
            rx_multicast: self.rx_multicast.wrapping_sub(previous.rx_multicast),
            tx_bytes: self.tx_bytes.wrapping_sub(previous.tx_bytes),
            tx_packets: self.tx_packets.wrapping_sub(previous.tx_packets),
            tx_errs: self.tx_errs.wrapping_sub(previous.tx_errs),
            tx_drop: self.tx_drop.wrapping_sub(previous.tx_drop),
            tx_fifo: self.tx_fifo.wrapping_sub(previous.tx_fifo),
            tx_colls: self.tx_colls.wrapping_sub(previous.tx_colls),
            tx_carrier: self.tx_carrier.wrapping_sub(previous.tx_carrier),
            tx_compressed: self.tx_compressed.wrapping_sub(previous.tx_compressed),
        }
    }
}

impl Delta for NetInterfaceList {
    /// Pairs interfaces by name. Interfaces missing from `previous` (newly
    /// appeared) are returned unchanged; interfaces that disappeared are
    /// dropped.
    fn delta(&self, previous: &Self) -> Self {
        let list = self
            .list
            .iter()
            .map(|current| {
                match previous.list.iter().find(|prev| prev.name == current.name) {
                    Some(prev) => current.delta(prev),
                    None => current.clone(),
                }
            })
            .collect();
        NetInterfaceList { list }
    }
}

/// Share of non-idle time in a CPU delta, in percent.
///
/// Returns `None` for an empty delta (no ticks elapsed).
pub fn cpu_busy_percent(delta: &Cpu) -> Option<f64> {
    let total = delta.total();
    if total == 0 {
        return None;
    }
    let idle = delta.idle.wrapping_add(delta.wait);
    Some(total.saturating_sub(idle) as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(user: u64, sys: u64, idle: u64) -> Cpu {
        Cpu {
            user,
            nice: 1,
            sys,
            idle,
            wait: 2,
            irq: 3,
            soft_irq: 4,
            stolen: 5,
        }
    }

    fn iface(name: &str, rx: u64, tx: u64) -> NetInterface {
        NetInterface {
            name: name.to_string(),
            rx_bytes: rx,
            rx_packets: rx / 100,
            tx_bytes: tx,
            tx_packets: tx / 100,
            ..NetInterface::default()
        }
    }

    #[test]
    fn test_cpu_delta_total_matches_total_difference() {
        let older = cpu(1000, 300, 9000);
        let newer = cpu(1250, 340, 9500);

        let delta = newer.delta(&older);

        assert_eq!(delta.user, 250);
        assert_eq!(delta.sys, 40);
        assert_eq!(delta.idle, 500);
        assert_eq!(delta.nice, 0);
        assert_eq!(delta.total(), newer.total() - older.total());
    }

    #[test]
    fn test_cpu_delta_of_identical_snapshots_is_zero() {
        let sample = cpu(123, 456, 789);
        assert_eq!(sample.delta(&sample), Cpu::default());
    }

    #[test]
    fn test_cpu_delta_out_of_order_wraps() {
        let older = cpu(100, 0, 0);
        let newer = cpu(150, 0, 0);

        let delta = older.delta(&newer);

        assert_eq!(delta.user, u64::MAX - 49);
        assert_eq!(delta.total(), older.total().wrapping_sub(newer.total()));
    }

    #[test]
    fn test_net_delta_keeps_left_name() {
        let older = iface("eth0", 1000, 500);
        let newer = iface("eth0", 4000, 900);

        let delta = newer.delta(&older);

        assert_eq!(delta.name, "eth0");
        assert_eq!(delta.rx_bytes, 3000);
        assert_eq!(delta.rx_packets, 30);
        assert_eq!(delta.tx_bytes, 400);
        assert_eq!(delta.tx_packets, 4);
        assert_eq!(delta.rx_errs, 0);

        let renamed = iface("eth1", 4000, 900).delta(&older);
        assert_eq!(renamed.name, "eth1");
    }

    #[test]
    fn test_net_delta_counter_reset_wraps() {
        let before_reset = iface("wlan0", 5000, 0);
        let after_reset = iface("wlan0", 10, 0);

        let delta = after_reset.delta(&before_reset);

        assert_eq!(delta.rx_bytes, 10u64.wrapping_sub(5000));
    }

    #[test]
    fn test_net_list_delta_pairs_by_name() {
        let previous = NetInterfaceList {
            list: vec![iface("lo", 100, 100), iface("eth0", 1000, 2000)],
        };
        let current = NetInterfaceList {
            list: vec![
                iface("eth0", 1500, 2600),
                iface("lo", 300, 300),
                iface("docker0", 700, 0),
            ],
        };

        let delta = current.delta(&previous);

        assert_eq!(delta.list.len(), 3);
        assert_eq!(delta.list[0].name, "eth0");
        assert_eq!(delta.list[0].rx_bytes, 500);
        assert_eq!(delta.list[0].tx_bytes, 600);
        assert_eq!(delta.list[1].rx_bytes, 200);
        assert_eq!(delta.list[2], iface("docker0", 700, 0));
    }

    #[test]
    fn test_cpu_busy_percent() {
        let delta = Cpu {
            user: 30,
            sys: 10,
            idle: 50,
            wait: 10,
            ..Cpu::default()
        };
        let busy = cpu_busy_percent(&delta).unwrap();
        assert!((busy - 40.0).abs() < 1e-9);
        assert_eq!(cpu_busy_percent(&Cpu::default()), None);
    }
}
