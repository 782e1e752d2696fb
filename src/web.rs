//! Browser binding
//!
//! Drives a [`Lottery`] with one `setTimeout` per scheduled event and hands
//! ticks and the reveal to JavaScript callbacks as arrays of face ids.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::{DetectedFace, Lottery, LotteryError, SelectionSink, Settings};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // Ignore double init when the module is instantiated twice
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Face Lottery ready");
}

fn to_js(e: LotteryError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn ids_to_array(ids: &[u32]) -> Array {
    ids.iter().map(|&id| JsValue::from(id)).collect()
}

/// Callbacks collected while the session is borrowed, replayed afterwards
enum Event {
    Tick(Vec<u32>),
    Complete(Vec<u32>),
}

#[derive(Default)]
struct EventBuffer(Vec<Event>);

impl SelectionSink<DetectedFace> for EventBuffer {
    fn on_tick(&mut self, subset: &[DetectedFace]) {
        self.0.push(Event::Tick(subset.iter().map(|f| f.id).collect()));
    }

    fn on_complete(&mut self, winners: &[DetectedFace]) {
        self.0.push(Event::Complete(winners.iter().map(|f| f.id).collect()));
    }
}

struct Driver {
    lottery: Lottery<DetectedFace>,
    on_tick: Option<Function>,
    on_complete: Option<Function>,
    /// Pending `setTimeout` handle
    timer: Option<i32>,
    /// Bumped on every start/cancel; stale timers compare and bail out
    generation: u64,
}

impl Driver {
    fn clear_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(handle);
            }
        }
    }
}

/// A lottery over faces detected by the page
#[wasm_bindgen]
pub struct WebLottery {
    inner: Rc<RefCell<Driver>>,
}

#[wasm_bindgen]
impl WebLottery {
    /// `faces_json` is an array of `{ id, box: { x, y, width, height }, confidence }`
    #[wasm_bindgen(constructor)]
    pub fn new(faces_json: &str) -> Result<WebLottery, JsValue> {
        let faces: Vec<DetectedFace> =
            serde_json::from_str(faces_json).map_err(|e| to_js(e.into()))?;
        let lottery = Lottery::with_settings(faces, Settings::load()).map_err(to_js)?;
        log::info!("Lottery ready with {} faces", lottery.candidates().len());

        Ok(Self {
            inner: Rc::new(RefCell::new(Driver {
                lottery,
                on_tick: None,
                on_complete: None,
                timer: None,
                generation: 0,
            })),
        })
    }

    /// Start a run, cancelling any run still in flight
    pub fn start(
        &self,
        winner_count: usize,
        on_tick: Function,
        on_complete: Function,
    ) -> Result<(), JsValue> {
        let generation = {
            let mut driver = self.inner.borrow_mut();
            driver.clear_timer();
            driver.generation += 1;

            let kept = driver.lottery.set_winner_count(winner_count);
            driver.lottery.start().map_err(to_js)?;
            driver.on_tick = Some(on_tick);
            driver.on_complete = Some(on_complete);

            let settings = Settings {
                winner_count: kept,
                ..driver.lottery.settings().clone()
            };
            settings.save();
            driver.generation
        };
        schedule(&self.inner, generation)
    }

    /// Stop the current run. Returns `true` if one was in flight.
    pub fn cancel(&self) -> bool {
        let mut driver = self.inner.borrow_mut();
        driver.clear_timer();
        driver.generation += 1;
        driver.lottery.cancel()
    }

    /// Forget the last result
    pub fn reset(&self) {
        let mut driver = self.inner.borrow_mut();
        driver.clear_timer();
        driver.generation += 1;
        driver.lottery.reset();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.borrow().lottery.is_animating()
    }

    /// Ids currently highlighted (flicker subset, or winners after the reveal)
    pub fn highlighted(&self) -> Array {
        ids_to_array(self.inner.borrow().lottery.highlighted())
    }

    /// Ids of the authoritative winners
    pub fn winners(&self) -> Array {
        let driver = self.inner.borrow();
        let ids: Vec<u32> = driver.lottery.winners().iter().map(|f| f.id).collect();
        ids_to_array(&ids)
    }

    #[wasm_bindgen(js_name = winnerCount)]
    pub fn winner_count(&self) -> usize {
        self.inner.borrow().lottery.winner_count()
    }

    #[wasm_bindgen(js_name = lastSeed)]
    pub fn last_seed(&self) -> Option<u64> {
        self.inner.borrow().lottery.last_seed()
    }
}

/// Arm a timer for the next event of the current run
fn schedule(inner: &Rc<RefCell<Driver>>, generation: u64) -> Result<(), JsValue> {
    let mut driver = inner.borrow_mut();
    let Some(wait) = driver.lottery.next_wait_ms() else {
        return Ok(());
    };

    let weak = Rc::downgrade(inner);
    let callback = Closure::once_into_js(move || {
        if let Some(inner) = weak.upgrade() {
            step(&inner, generation, wait);
        }
    });
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        wait as i32,
    )?;
    driver.timer = Some(handle);
    Ok(())
}

/// Timer body: advance, release the borrow, then call into JavaScript
fn step(inner: &Rc<RefCell<Driver>>, generation: u64, wait: u64) {
    let (events, on_tick, on_complete) = {
        let mut driver = inner.borrow_mut();
        if driver.generation != generation {
            return;
        }
        driver.timer = None;
        let mut buffer = EventBuffer::default();
        driver.lottery.advance_with(wait, &mut buffer);
        (buffer.0, driver.on_tick.clone(), driver.on_complete.clone())
    };

    for event in events {
        // A callback may have cancelled or restarted the lottery
        if inner.borrow().generation != generation {
            return;
        }
        let (callback, ids) = match &event {
            Event::Tick(ids) => (on_tick.as_ref(), ids),
            Event::Complete(ids) => (on_complete.as_ref(), ids),
        };
        if let Some(callback) = callback {
            if let Err(e) = callback.call1(&JsValue::NULL, &ids_to_array(ids)) {
                log::warn!("Lottery callback threw: {:?}", e);
            }
        }
    }

    if inner.borrow().generation == generation {
        if let Err(e) = schedule(inner, generation) {
            log::error!("Failed to schedule next tick: {:?}", e);
        }
    }
}
