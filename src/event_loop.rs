use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crate::visualizer::scheduler::{Scheduler, TickToken};

pub type TimerId = usize;

#[derive(Debug)]
struct TimerSlot {
    interval: Duration,
    deadline: Instant,
    generation: u64,
    armed: bool,
}

#[derive(Debug, Default)]
struct TimerQueue {
    slots: Vec<TimerSlot>,
}

impl TimerQueue {
    fn earliest(&self) -> Option<(TimerId, Instant)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.armed)
            .map(|(id, s)| (id, s.deadline))
            .min_by_key(|&(_, deadline)| deadline)
    }
}

/// Handle to one timer of an [`EventLoop`].
pub struct LoopTimer {
    queue: Rc<RefCell<TimerQueue>>,
    id: TimerId,
}

impl LoopTimer {
    pub fn id(&self) -> TimerId {
        self.id
    }
}

impl Scheduler for LoopTimer {
    fn start(&mut self, interval: Duration) -> TickToken {
        let mut queue = self.queue.borrow_mut();
        let slot = &mut queue.slots[self.id];
        slot.generation += 1;
        slot.interval = interval;
        slot.deadline = Instant::now() + interval;
        slot.armed = true;
        TickToken(slot.generation)
    }

    fn stop(&mut self) {
        self.queue.borrow_mut().slots[self.id].armed = false;
    }
}

#[derive(Debug, PartialEq)]
pub enum Event<C> {
    Timer(TimerId, TickToken),
    Command(C),
}

/// Single-threaded loop multiplexing periodic timers with commands arriving
/// over a channel. Fires are produced lazily when polled, so a timer stopped
/// before its deadline never fires, and one fire is handled to completion
/// before the next is computed.
pub struct EventLoop<C> {
    queue: Rc<RefCell<TimerQueue>>,
    commands: Receiver<C>,
    commands_open: bool,
}

impl<C> EventLoop<C> {
    pub fn new(commands: Receiver<C>) -> Self {
        Self {
            queue: Rc::new(RefCell::new(TimerQueue::default())),
            commands,
            commands_open: true,
        }
    }

    /// Register a new, initially stopped timer.
    pub fn timer(&self) -> LoopTimer {
        let mut queue = self.queue.borrow_mut();
        queue.slots.push(TimerSlot {
            interval: Duration::ZERO,
            deadline: Instant::now(),
            generation: 0,
            armed: false,
        });
        LoopTimer {
            queue: Rc::clone(&self.queue),
            id: queue.slots.len() - 1,
        }
    }

    /// Block until the next timer fire or command. Returns `None` once the
    /// command channel is closed and no timer is armed.
    pub fn next_event(&mut self) -> Option<Event<C>> {
        loop {
            if self.commands_open {
                match self.commands.try_recv() {
                    Ok(cmd) => return Some(Event::Command(cmd)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => self.commands_open = false,
                }
            }

            let now = Instant::now();
            let earliest = self.queue.borrow().earliest();
            match earliest {
                Some((id, deadline)) if deadline <= now => {
                    let mut queue = self.queue.borrow_mut();
                    let slot = &mut queue.slots[id];
                    // Late fires queue up behind each other instead of overlapping
                    slot.deadline = (deadline + slot.interval).max(now);
                    return Some(Event::Timer(id, TickToken(slot.generation)));
                }
                Some((_, deadline)) => {
                    let wait = deadline - now;
                    if self.commands_open {
                        match self.commands.recv_timeout(wait) {
                            Ok(cmd) => return Some(Event::Command(cmd)),
                            Err(RecvTimeoutError::Timeout) => {}
                            Err(RecvTimeoutError::Disconnected) => self.commands_open = false,
                        }
                    } else {
                        std::thread::sleep(wait);
                    }
                }
                None => {
                    if !self.commands_open {
                        return None;
                    }
                    match self.commands.recv() {
                        Ok(cmd) => return Some(Event::Command(cmd)),
                        Err(_) => self.commands_open = false,
                    }
                }
            }
        }
    }
}
