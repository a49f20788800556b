// Communication channels lock-free

use crate::messaging::command::Command;
use crate::messaging::notification::Notification;
use crate::synth::effect::Signal;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<Command>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Voices the audio thread is done with, freed on the control side
pub type RetiredProducer = ringbuf::HeapProd<Box<dyn Signal>>;
pub type RetiredConsumer = ringbuf::HeapCons<Box<dyn Signal>>;

pub fn create_retired_channel(capacity: usize) -> (RetiredProducer, RetiredConsumer) {
    let rb = HeapRb::<Box<dyn Signal>>::new(capacity);
    rb.split()
}
