pub mod dispatcher;
pub mod gemini;
pub mod local_responder;
pub mod matcher;
pub mod metrics_manager;
pub mod remote_responder;
pub mod trainer;
