//! Some utility functions

use crate::countdown::scheduler::Scheduler;
use crate::task::Task;

/// One line describing a task and its countdown label
pub fn task_line(task: &Task, label: &str) -> String {
    let completion = if task.completed() { "✓" } else { " " };
    format!("    {} {}\t{}\t(deadline {})\t{}", completion, task.text(), label, task.deadline(), task.id())
}

/// A debug utility that pretty-prints a task
pub fn print_task(task: &Task, label: &str) {
    println!("{}", task_line(task, label));
}

/// A debug utility that pretty-prints tasks, with their current countdown labels
pub fn print_task_list(tasks: &[Task], scheduler: &Scheduler) {
    if tasks.is_empty() {
        println!("    (no tasks)");
    }
    for task in tasks {
        print_task(task, &scheduler.label_for(task.id()));
    }
}
