use crate::storage::{ByteStream, Reassembler};
use crate::wire::tcp::{Ack, Segment, SeqNumber};

use super::{Config, Receiver, Sender, MAX_WINDOW};

const ISN: SeqNumber = SeqNumber(12_345);

fn receiver(capacity: usize) -> Receiver {
    Receiver::new(Reassembler::new(ByteStream::new(capacity)))
}

fn sender(capacity: usize, config: Config) -> Sender {
    Sender::new(ByteStream::new(capacity), ISN, config)
}

fn segment(seqno: SeqNumber, payload: &[u8]) -> Segment {
    Segment { seqno, syn: false, payload: payload.to_vec(), fin: false, rst: false }
}

fn syn(seqno: SeqNumber) -> Segment {
    Segment { seqno, syn: true, payload: Vec::new(), fin: false, rst: false }
}

fn ack_of(ackno: SeqNumber, window_size: u16) -> Ack {
    Ack { ackno: Some(ackno), window_size, rst: false }
}

mod receiver_side {
    use super::*;

    #[test]
    fn no_ack_before_syn() {
        let mut rx = receiver(16);
        rx.receive(&segment(SeqNumber(100), b"ignored"));
        let ack = rx.ack();
        assert_eq!(ack.ackno, None);
        assert_eq!(ack.window_size, 16);
        assert_eq!(rx.reassembler().stream().bytes_pushed(), 0);
    }

    #[test]
    fn syn_then_payload() {
        let mut rx = receiver(16);
        rx.receive(&syn(ISN));
        assert_eq!(rx.ack().ackno, Some(ISN + 1));

        rx.receive(&segment(ISN + 1, b"ab"));
        let ack = rx.ack();
        assert_eq!(ack.ackno, Some(ISN + 3));
        assert_eq!(ack.window_size, 14);
        assert_eq!(rx.reassembler().stream().peek(), b"ab");
    }

    #[test]
    fn syn_carrying_payload() {
        let mut rx = receiver(16);
        let mut first = syn(ISN);
        first.payload = b"ab".to_vec();
        rx.receive(&first);
        assert_eq!(rx.ack().ackno, Some(ISN + 3));
    }

    #[test]
    fn out_of_order_segment_waits() {
        let mut rx = receiver(16);
        rx.receive(&syn(ISN));
        rx.receive(&segment(ISN + 3, b"cd"));
        assert_eq!(rx.ack().ackno, Some(ISN + 1));
        assert_eq!(rx.reassembler().bytes_pending(), 2);

        rx.receive(&segment(ISN + 1, b"ab"));
        assert_eq!(rx.ack().ackno, Some(ISN + 5));
        assert_eq!(rx.reassembler().stream().peek(), b"abcd");
    }

    #[test]
    fn fin_adds_one_once_closed() {
        let mut rx = receiver(16);
        let mut first = syn(ISN);
        first.payload = b"ab".to_vec();
        first.fin = true;
        rx.receive(&first);
        // SYN + two octets + FIN.
        assert_eq!(rx.ack().ackno, Some(ISN + 4));
        assert!(rx.reassembler().stream().is_closed());
    }

    #[test]
    fn fin_not_acked_while_bytes_missing() {
        let mut rx = receiver(16);
        rx.receive(&syn(ISN));
        let mut last = segment(ISN + 3, b"cd");
        last.fin = true;
        rx.receive(&last);
        assert_eq!(rx.ack().ackno, Some(ISN + 1));

        rx.receive(&segment(ISN + 1, b"ab"));
        assert_eq!(rx.ack().ackno, Some(ISN + 6));
    }

    #[test]
    fn window_is_clamped_to_wire_field() {
        let rx = receiver(1 << 20);
        assert_eq!(rx.ack().window_size as usize, MAX_WINDOW);
    }

    #[test]
    fn reset_flags_the_stream() {
        let mut rx = receiver(16);
        let mut evil = segment(SeqNumber(0), b"");
        evil.rst = true;
        rx.receive(&evil);
        assert!(rx.ack().rst);
    }
}

mod sender_side {
    use super::*;

    fn collect(sender: &mut Sender) -> Vec<Segment> {
        let mut sent = Vec::new();
        sender.push(|segment| sent.push(segment.clone()));
        sent
    }

    #[test]
    fn first_push_sends_syn_only() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"hello");
        let sent = collect(&mut tx);
        // The initial window of one has room for nothing but the SYN.
        assert_eq!(sent.len(), 1);
        assert!(sent[0].syn);
        assert_eq!(sent[0].seqno, ISN);
        assert_eq!(sent[0].payload, b"");
        assert_eq!(tx.sequence_numbers_in_flight(), 1);
    }

    #[test]
    fn push_fills_the_advertised_window() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"hello world");
        collect(&mut tx);
        tx.receive(&ack_of(ISN + 1, 4));

        let sent = collect(&mut tx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, b"hell");
        assert_eq!(tx.sequence_numbers_in_flight(), 4);

        // Window full: nothing further.
        assert!(collect(&mut tx).is_empty());
    }

    #[test]
    fn segments_are_split_at_max_payload_size() {
        let config = Config { max_payload_size: 2, ..Config::default() };
        let mut tx = sender(64, config);
        tx.stream_mut().push(b"abcde");
        collect(&mut tx);
        tx.receive(&ack_of(ISN + 1, 64));

        let sent = collect(&mut tx);
        let payloads: Vec<&[u8]> = sent.iter().map(|s| &s.payload[..]).collect();
        assert_eq!(payloads, vec![&b"ab"[..], b"cd", b"e"]);
    }

    #[test]
    fn fin_rides_the_last_segment_that_fits() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"ab");
        tx.stream_mut().close();
        collect(&mut tx);
        tx.receive(&ack_of(ISN + 1, 64));

        let sent = collect(&mut tx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, b"ab");
        assert!(sent[0].fin);

        // The FIN is sent exactly once.
        tx.receive(&ack_of(ISN + 4, 64));
        assert!(collect(&mut tx).is_empty());
        assert_eq!(tx.sequence_numbers_in_flight(), 0);
    }

    #[test]
    fn fin_waits_for_window_room() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"ab");
        tx.stream_mut().close();
        collect(&mut tx);
        tx.receive(&ack_of(ISN + 1, 2));

        let sent = collect(&mut tx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, b"ab");
        assert!(!sent[0].fin);

        tx.receive(&ack_of(ISN + 3, 1));
        let sent = collect(&mut tx);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].fin);
        assert_eq!(sent[0].payload, b"");
    }

    #[test]
    fn zero_window_is_probed_with_one_octet() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"xyz");
        collect(&mut tx);
        tx.receive(&ack_of(ISN + 1, 0));

        let sent = collect(&mut tx);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload, b"x");
        assert_eq!(tx.sequence_numbers_in_flight(), 1);
    }

    #[test]
    fn retransmits_oldest_with_backoff() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"hi");
        collect(&mut tx);

        let mut resent = Vec::new();
        tx.tick(999, |segment| resent.push(segment.clone()));
        assert!(resent.is_empty());

        tx.tick(1, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 1);
        assert!(resent[0].syn);
        assert_eq!(tx.consecutive_retransmissions(), 1);

        // Backoff doubled: the next retransmission takes 2000 ms.
        tx.tick(1999, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 1);
        tx.tick(1, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 2);
        assert_eq!(tx.consecutive_retransmissions(), 2);
    }

    #[test]
    fn zero_window_probe_does_not_back_off() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"xyz");
        collect(&mut tx);
        tx.receive(&ack_of(ISN + 1, 0));
        collect(&mut tx);

        let mut resent = Vec::new();
        tx.tick(1000, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 1);
        // Timeout unchanged: fires again after another initial interval.
        tx.tick(1000, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 2);
    }

    #[test]
    fn forward_progress_resets_retransmission_state() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"abcd");
        collect(&mut tx);
        tx.tick(1000, |_| {});
        assert_eq!(tx.consecutive_retransmissions(), 1);

        tx.receive(&ack_of(ISN + 1, 4));
        assert_eq!(tx.consecutive_retransmissions(), 0);

        collect(&mut tx);
        // Timer restarted at the initial timeout, not the doubled one.
        let mut resent = Vec::new();
        tx.tick(1000, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 1);
        assert_eq!(resent[0].payload, b"abcd");
    }

    #[test]
    fn retry_ceiling_stops_retransmissions() {
        let config = Config { max_retransmit_attempts: 2, ..Config::default() };
        let mut tx = sender(64, config);
        tx.stream_mut().push(b"hi");
        collect(&mut tx);

        let mut resent = Vec::new();
        tx.tick(1000, |segment| resent.push(segment.clone()));
        tx.tick(2000, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 2);
        assert_eq!(tx.consecutive_retransmissions(), 2);

        // The timer keeps firing but nothing further goes out.
        tx.tick(4000, |segment| resent.push(segment.clone()));
        tx.tick(8000, |segment| resent.push(segment.clone()));
        assert_eq!(resent.len(), 2);
        assert_eq!(tx.consecutive_retransmissions(), 2);
    }

    #[test]
    fn stale_and_overrunning_acks_are_ignored() {
        let mut tx = sender(64, Config::default());
        tx.stream_mut().push(b"ab");
        collect(&mut tx);
        tx.receive(&ack_of(ISN + 1, 8));
        collect(&mut tx);
        assert_eq!(tx.sequence_numbers_in_flight(), 2);

        // Re-acking the SYN moves nothing.
        tx.receive(&ack_of(ISN + 1, 8));
        assert_eq!(tx.sequence_numbers_in_flight(), 2);

        // Acking beyond the cursor moves nothing either.
        tx.receive(&ack_of(ISN + 9, 8));
        assert_eq!(tx.sequence_numbers_in_flight(), 2);
    }

    #[test]
    fn ack_without_number_forces_syn_again() {
        let mut tx = sender(64, Config::default());
        collect(&mut tx);
        assert_eq!(tx.sequence_numbers_in_flight(), 1);

        tx.receive(&Ack { ackno: None, window_size: 4, rst: false });
        let sent = collect(&mut tx);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].syn);
        assert_eq!(sent[0].seqno, ISN + 1);
    }

    #[test]
    fn reset_propagates_to_the_stream() {
        let mut tx = sender(64, Config::default());
        tx.receive(&Ack { ackno: None, window_size: 0, rst: true });
        assert!(tx.stream().has_error());
        assert!(tx.empty_segment().rst);
    }
}
