// ============================================================================
// Console Output Macros
// ============================================================================
// Human-readable colored output for CLI runs. Structured consumers use
// `RunEvent` instead; these only ever write to stdout.
// ============================================================================

/// Logs the start of a workflow step with a header and the role it runs.
///
/// # Example
/// ```
/// use devteam_sdk::log_step_start_console;
/// log_step_start_console!(1, 3, "product-manager", "requirements");
/// ```
///
/// Outputs:
/// ```text
/// ═══ STEP 1/3: product-manager ═══
/// → requirements
/// ```
#[macro_export]
macro_rules! log_step_start_console {
    ($step:expr, $total:expr, $role:expr, $output_key:expr) => {
        println!("\x1b[1;36m═══ STEP {}/{}: {} ═══\x1b[0m", $step, $total, $role);
        println!("\x1b[36m→ {}\x1b[0m", $output_key);
    };
}

/// Logs the completion of a workflow step.
///
/// # Example
/// ```
/// use devteam_sdk::log_step_complete_console;
/// log_step_complete_console!(1, 0.0125);
/// ```
///
/// Outputs:
/// ```text
/// ✓ Step 1 complete ($0.0125)
/// ```
#[macro_export]
macro_rules! log_step_complete_console {
    ($step:expr, $cost:expr) => {
        println!("\x1b[32m✓ Step {} complete (${:.4})\x1b[0m", $step, $cost);
    };
}

/// Logs a failed workflow step.
#[macro_export]
macro_rules! log_step_failed_console {
    ($step:expr, $error:expr) => {
        println!("\x1b[31m✗ Step {} failed: {}\x1b[0m", $step, $error);
    };
}

/// Logs per-call token statistics.
///
/// # Example
/// ```
/// use devteam_sdk::log_stats;
/// log_stats!("sonnet", 0.0234, 1234, 567);
/// ```
///
/// Outputs:
/// ```text
/// Statistics: sonnet, $0.0234 (tokens: 1234 in / 567 out)
/// ```
#[macro_export]
macro_rules! log_stats {
    ($model:expr, $cost_usd:expr, $input_tokens:expr, $output_tokens:expr) => {
        println!(
            "\x1b[2mStatistics: {}, ${:.4} (tokens: {} in / {} out)\x1b[0m",
            $model, $cost_usd, $input_tokens, $output_tokens
        );
    };
}

/// Logs aggregate statistics for a finished run.
///
/// # Example
/// ```
/// use devteam_sdk::log_aggregate_stats;
/// log_aggregate_stats!(5, 6234, 0.1145);
/// ```
///
/// Outputs:
/// ```text
/// Total: 5 steps, 6.2s, $0.1145
/// ```
#[macro_export]
macro_rules! log_aggregate_stats {
    ($step_count:expr, $total_duration_ms:expr, $total_cost_usd:expr) => {
        println!(
            "\x1b[1mTotal: {} steps, {:.1}s, ${:.4}\x1b[0m",
            $step_count,
            $total_duration_ms as f64 / 1000.0,
            $total_cost_usd
        );
    };
}

/// Logs an informational message.
///
/// # Example
/// ```
/// use devteam_sdk::log_info;
/// log_info!("Loading workflow...");
/// ```
///
/// Outputs:
/// ```text
/// ℹ Loading workflow...
/// ```
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        println!("\x1b[36mℹ {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[36mℹ {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs a warning message.
///
/// # Example
/// ```
/// use devteam_sdk::log_warning;
/// log_warning!("Payment features detected");
/// ```
///
/// Outputs:
/// ```text
/// ⚠ Warning: Payment features detected
/// ```
#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", $message);
    };
    ($fmt:expr, $($arg:tt)*) => {
        println!("\x1b[33m⚠ Warning: {}\x1b[0m", format!($fmt, $($arg)*));
    };
}

/// Logs that a file has been saved.
///
/// # Example
/// ```
/// use devteam_sdk::log_file_saved;
/// log_file_saved!("./generated-app/package.json");
/// ```
///
/// Outputs:
/// ```text
/// ✓ Saved: ./generated-app/package.json
/// ```
#[macro_export]
macro_rules! log_file_saved {
    ($path:expr) => {
        println!("\x1b[32m✓ Saved: {}\x1b[0m", $path);
    };
}
