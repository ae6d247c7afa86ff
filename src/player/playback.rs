use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread::JoinHandle,
    time::{Duration, Instant},
};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{error, info, warn};

use super::{
    config::PlaybackConfig,
    error::PlaybackError,
    geometry::{GeometrySync, StatusLine},
    motion::MotionSequence,
    target::RenderTarget,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepDirection {
    Backward,
    Forward,
}

impl StepDirection {
    fn offset(self) -> isize {
        match self {
            StepDirection::Backward => -1,
            StepDirection::Forward => 1,
        }
    }
}

/// `current + offset`, wrapped into `0..frame_count` in both directions.
pub fn wrap_frame(current: usize, offset: isize, frame_count: usize) -> usize {
    debug_assert!(frame_count > 0);
    (current as isize + offset).rem_euclid(frame_count as isize) as usize
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_frame: usize,
    pub is_playing: bool,
    pub frame_rate: f32,
}

/// The frame index together with the only writer of the live buffers. Whoever holds the
/// playhead is the single writer.
struct Playhead<T: RenderTarget> {
    frame: usize,
    sync: GeometrySync<T>,
}

impl<T: RenderTarget> Playhead<T> {
    fn show(
        &mut self,
        motion: &MotionSequence,
        frame: usize,
        playing: bool,
    ) -> Result<(), PlaybackError> {
        let joints = motion.frame(frame)?;
        self.sync.apply_frame(
            joints,
            StatusLine {
                frame,
                last_frame: motion.last_index(),
                playing,
            },
        )?;
        self.frame = frame;
        Ok(())
    }
}

type TaskOutput<T> = (Playhead<T>, Result<(), PlaybackError>);

/// A running playback loop. The loop owns the playhead until it is joined.
struct PlaybackTask<T: RenderTarget> {
    /// Dropping the sender is the stop signal.
    stop: Sender<()>,
    position: Arc<AtomicUsize>,
    handle: JoinHandle<TaskOutput<T>>,
}

impl<T: RenderTarget> PlaybackTask<T> {
    fn spawn(playhead: Playhead<T>, motion: Arc<MotionSequence>, interval: Duration) -> Self {
        let (stop, stop_rx) = channel::bounded(0);
        let position = Arc::new(AtomicUsize::new(playhead.frame));

        let handle = {
            let position = Arc::clone(&position);
            std::thread::spawn(move || run(playhead, &motion, interval, &stop_rx, &position))
        };

        Self {
            stop,
            position,
            handle,
        }
    }

    fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Signal the loop to stop and wait for it to hand back the playhead.
    fn join(self) -> Result<TaskOutput<T>, PlaybackError> {
        drop(self.stop);
        self.handle.join().map_err(|_| PlaybackError::WorkerPanicked)
    }
}

fn run<T: RenderTarget>(
    mut playhead: Playhead<T>,
    motion: &MotionSequence,
    interval: Duration,
    stop: &Receiver<()>,
    position: &AtomicUsize,
) -> TaskOutput<T> {
    let mut deadline = Instant::now();

    loop {
        if !matches!(stop.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }

        let next = wrap_frame(playhead.frame, 1, motion.frame_count());
        if let Err(err) = playhead.show(motion, next, true) {
            error!("Playback stopped: {err}");
            return (playhead, Err(err));
        }
        position.store(next, Ordering::Release);

        deadline += interval;
        let now = Instant::now();
        if deadline < now {
            // Fell behind, don't try to catch up with a burst of frames.
            deadline = now + interval;
        }

        match stop.recv_deadline(deadline) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    (playhead, Ok(()))
}

enum Mode<T: RenderTarget> {
    Stopped(Playhead<T>),
    Playing(PlaybackTask<T>),
    Closed { frame: usize },
}

/// Owns animation time for one motion: play, pause, step, reset and quit.
pub struct PlaybackController<T: RenderTarget> {
    motion: Arc<MotionSequence>,
    frame_rate: f32,
    interval: Duration,
    mode: Mode<T>,
}

impl<T: RenderTarget> PlaybackController<T> {
    /// Creates a stopped controller showing the configured start frame.
    pub fn new(
        motion: Arc<MotionSequence>,
        sync: GeometrySync<T>,
        config: PlaybackConfig,
    ) -> Result<Self, PlaybackError> {
        let interval = config.frame_interval()?;

        let start = config.start_frame;
        let mut playhead = Playhead { frame: start, sync };
        playhead.show(&motion, start, false)?;

        Ok(Self {
            motion,
            frame_rate: config.frame_rate,
            interval,
            mode: Mode::Stopped(playhead),
        })
    }

    pub fn motion(&self) -> &Arc<MotionSequence> {
        &self.motion
    }

    pub fn state(&self) -> PlaybackState {
        let (current_frame, is_playing) = match &self.mode {
            Mode::Stopped(playhead) => (playhead.frame, false),
            Mode::Playing(task) => (task.position(), !task.handle.is_finished()),
            Mode::Closed { frame } => (*frame, false),
        };

        PlaybackState {
            current_frame,
            is_playing,
            frame_rate: self.frame_rate,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.mode, Mode::Closed { .. })
    }

    pub fn toggle(&mut self) -> Result<(), PlaybackError> {
        if matches!(self.mode, Mode::Playing(_)) {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Start advancing frames. Does nothing if already playing.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let frame = self.state().current_frame;
        match std::mem::replace(&mut self.mode, Mode::Closed { frame }) {
            Mode::Stopped(playhead) => {
                info!("Playback started at frame {}", playhead.frame);
                self.mode = Mode::Playing(PlaybackTask::spawn(
                    playhead,
                    Arc::clone(&self.motion),
                    self.interval,
                ));
                Ok(())
            }
            mode @ Mode::Playing(_) => {
                self.mode = mode;
                Ok(())
            }
            mode @ Mode::Closed { .. } => {
                self.mode = mode;
                Err(PlaybackError::SessionClosed)
            }
        }
    }

    /// Stop advancing frames. Does nothing if already stopped.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.halt()? {
            // The last frame was shown with a "Play" status.
            self.show_with(|frame| frame)?;
        }
        Ok(())
    }

    pub fn step(&mut self, direction: StepDirection) -> Result<(), PlaybackError> {
        self.halt()?;
        let frame_count = self.motion.frame_count();
        self.show_with(|frame| wrap_frame(frame, direction.offset(), frame_count))
    }

    /// Stop and go back to the first frame.
    pub fn reset(&mut self) -> Result<(), PlaybackError> {
        self.halt()?;
        self.show_with(|_| 0)?;
        info!("Playback reset");
        Ok(())
    }

    /// Stop playback and release the render target. Every later command fails with
    /// [`PlaybackError::SessionClosed`].
    pub fn quit(&mut self) -> Result<(), PlaybackError> {
        if self.is_closed() {
            return Ok(());
        }

        let halted = self.halt();
        let frame = self.state().current_frame;
        let closed = match std::mem::replace(&mut self.mode, Mode::Closed { frame }) {
            Mode::Stopped(mut playhead) => playhead.sync.close().map_err(PlaybackError::from),
            _ => Ok(()),
        };
        info!("Playback session closed at frame {frame}");

        halted.and(closed)
    }

    /// Collect a playback loop that ended by itself and report why it ended.
    pub fn poll(&mut self) -> Result<(), PlaybackError> {
        if matches!(&self.mode, Mode::Playing(task) if task.handle.is_finished()) {
            self.halt()?;
        }
        Ok(())
    }

    /// Stop the playback loop if there is one and take the playhead back. Returns `true` if a
    /// loop was stopped.
    fn halt(&mut self) -> Result<bool, PlaybackError> {
        let frame = self.state().current_frame;
        match std::mem::replace(&mut self.mode, Mode::Closed { frame }) {
            Mode::Playing(task) => match task.join() {
                Ok((playhead, result)) => {
                    info!("Playback stopped at frame {}", playhead.frame);
                    self.mode = Mode::Stopped(playhead);
                    result.map(|_| true)
                }
                Err(err) => {
                    // The render target went down with the thread.
                    error!("{err}");
                    Err(err)
                }
            },
            mode => {
                self.mode = mode;
                Ok(false)
            }
        }
    }

    /// Show the frame `select` picks from the current one. Only valid while stopped.
    fn show_with(&mut self, select: impl FnOnce(usize) -> usize) -> Result<(), PlaybackError> {
        match &mut self.mode {
            Mode::Stopped(playhead) => {
                let frame = select(playhead.frame);
                playhead.show(&self.motion, frame, false)
            }
            Mode::Playing(_) | Mode::Closed { .. } => Err(PlaybackError::SessionClosed),
        }
    }
}

impl<T: RenderTarget> Drop for PlaybackController<T> {
    fn drop(&mut self) {
        if let Err(err) = self.halt() {
            warn!("Playback ended with an error: {err}");
        }
    }
}
