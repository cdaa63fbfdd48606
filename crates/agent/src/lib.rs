//! The reasoning agent behind ZapRelay's orchestrator seam.
//!
//! The agent follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Receive** the relay's directive and the sender's message
//! 2. **Send to LLM** via the configured provider, with the tool surface attached
//! 3. **If tool calls**: execute tools, append results, loop back to step 2
//! 4. **If text response**: hand it back to the relay as the one final answer
//!
//! The loop continues until the LLM responds with text only (no tool calls)
//! or the max iteration limit is reached.

pub mod loop_runner;

pub use loop_runner::AgentLoop;
