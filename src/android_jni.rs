//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to an `external fun` declaration
//! in HudBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Data crosses the boundary as JSON. A session lives behind an opaque
//! `long` handle from `createSession` until `destroySession`. All calls
//! for one handle come from the UI thread.

use chrono::{DateTime, FixedOffset, Utc};
use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{jint, jlong, jstring};
use jni::JNIEnv;
use log::{error, warn};

use crate::config::HudConfig;
use crate::dispatch::Place;
use crate::error::{Error, Result};
use crate::replay;
use crate::session::{HudEvent, NavSession};
use crate::share::SharePayload;

const ILLEGAL_ARGUMENT: &str = "java/lang/IllegalArgumentException";

fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("navhud"),
    );
}

/// Returns the rust-core library version.
/// Maps to: HudBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navhud_app_HudBridge_version(
    env: JNIEnv,
    _class: JClass,
) -> jstring {
    let version = crate::VERSION;
    env.new_string(version)
        .map(|s| s.into_raw())
        .unwrap_or(std::ptr::null_mut())
}

/// Maps to: HudBridge.createSession(configJson: String) -> Long
///
/// Returns 0 (and throws) when the config is invalid.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navhud_app_HudBridge_createSession(
    mut env: JNIEnv,
    _class: JClass,
    config_json: JString,
) -> jlong {
    init_logging();

    let config = read_string(&mut env, &config_json).and_then(|json| HudConfig::from_json(&json));
    match config {
        Ok(config) => Box::into_raw(Box::new(NavSession::new(config))) as jlong,
        Err(e) => {
            throw(&mut env, &e);
            0
        }
    }
}

/// Maps to: HudBridge.destroySession(handle: Long)
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navhud_app_HudBridge_destroySession(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    if handle == 0 {
        return;
    }
    // SAFETY: the handle came from Box::into_raw in createSession and the
    // Kotlin side never uses it again after this call.
    drop(unsafe { Box::from_raw(handle as *mut NavSession) });
}

/// Feed one event; returns the outbound commands as a JSON array.
/// Maps to: HudBridge.handleEvent(handle: Long, eventJson: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navhud_app_HudBridge_handleEvent(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    event_json: JString,
) -> jstring {
    let Some(session) = session_mut(handle) else {
        warn!("handleEvent on a null session");
        return std::ptr::null_mut();
    };

    let result = read_string(&mut env, &event_json).and_then(|json| {
        let event: HudEvent = serde_json::from_str(&json)?;
        let outbound = session.handle(event, Utc::now());
        Ok(serde_json::to_string(&outbound)?)
    });
    respond(&mut env, result)
}

/// Render a frame for the device clock.
/// Maps to: HudBridge.frame(handle: Long, nowMillis: Long, utcOffsetSeconds: Int) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navhud_app_HudBridge_frame(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    now_millis: jlong,
    utc_offset_seconds: jint,
) -> jstring {
    let Some(session) = session_mut(handle) else {
        warn!("frame on a null session");
        return std::ptr::null_mut();
    };

    let result = local_time(now_millis, utc_offset_seconds)
        .and_then(|now| Ok(serde_json::to_string(&session.frame(now))?));
    respond(&mut env, result)
}

/// Convert a recorded GPX track into telemetry samples (JSON array).
/// Maps to: HudBridge.replayToJson(data: ByteArray) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navhud_app_HudBridge_replayToJson(
    mut env: JNIEnv,
    _class: JClass,
    data: JByteArray,
) -> jstring {
    let result = env
        .convert_byte_array(&data)
        .map_err(Error::from)
        .and_then(|bytes| replay::parse_bytes(&bytes))
        .and_then(|samples| Ok(serde_json::to_string(&samples)?));
    respond(&mut env, result)
}

/// Share sheet and clipboard text for a place; Kotlin runs the fallback.
/// Maps to: HudBridge.sharePayload(placeJson: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_navhud_app_HudBridge_sharePayload(
    mut env: JNIEnv,
    _class: JClass,
    place_json: JString,
) -> jstring {
    let result = read_string(&mut env, &place_json).and_then(|json| {
        let place: Place = serde_json::from_str(&json)?;
        Ok(serde_json::to_string(&SharePayload::for_place(&place))?)
    });
    respond(&mut env, result)
}

fn session_mut<'a>(handle: jlong) -> Option<&'a mut NavSession> {
    // SAFETY: non-zero handles are live pointers from createSession, and
    // the UI thread is the only caller, so no other reference exists.
    unsafe { (handle as *mut NavSession).as_mut() }
}

fn local_time(now_millis: jlong, utc_offset_seconds: jint) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(utc_offset_seconds)
        .ok_or_else(|| Error::Time(format!("offset out of range: {utc_offset_seconds}")))?;
    let now = DateTime::<Utc>::from_timestamp_millis(now_millis)
        .ok_or_else(|| Error::Time(format!("timestamp out of range: {now_millis}")))?;
    Ok(now.with_timezone(&offset))
}

fn read_string(env: &mut JNIEnv, value: &JString) -> Result<String> {
    Ok(env.get_string(value)?.into())
}

fn respond(env: &mut JNIEnv, result: Result<String>) -> jstring {
    match result.and_then(|json| Ok(env.new_string(json)?)) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            throw(env, &e);
            std::ptr::null_mut()
        }
    }
}

fn throw(env: &mut JNIEnv, err: &Error) {
    error!("bridge call failed: {err}");
    if let Err(e) = env.throw_new(ILLEGAL_ARGUMENT, err.to_string()) {
        error!("could not raise {ILLEGAL_ARGUMENT}: {e}");
    }
}
