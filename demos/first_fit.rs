use std::io::Read;

use firstfit::{AllocError, Heap, Ptr, SbrkSource};

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`, `htop`,
/// `gdb`, or just visually track how the free list and program break change.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    SbrkSource::program_break(),
  );
}

fn print_alloc(
  heap: &mut Heap<SbrkSource>,
  ptr: Ptr,
) {
  println!(
    "Allocated {} bytes at offset {:#x}, address = {:?}",
    heap.usable_size(ptr),
    ptr.offset(),
    heap.as_ptr(ptr),
  );
  print!("{}", heap.free_list());
}

fn main() -> Result<(), AllocError> {
  let mut heap = Heap::sbrk();

  print_program_break("start");
  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 1) The first allocation grows the heap by one increment and splits it.
  // --------------------------------------------------------------------
  let first = heap.allocate(100)?;
  println!("\n[1] allocate(100)");
  print_alloc(&mut heap, first);
  print_program_break("after first growth");

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 2) The next one is carved out of the remainder, no growth.
  // --------------------------------------------------------------------
  let second = heap.allocate(50)?;
  println!("\n[2] allocate(50)");
  print_alloc(&mut heap, second);

  heap.bytes_mut(second).fill(0xAB);
  println!("[2] Initialized second block with 0xAB");

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 3) Free the first block and ask for something smaller: first fit
  //    hands the same block back.
  // --------------------------------------------------------------------
  heap.deallocate(Some(first));
  println!("\n[3] Deallocated first block");
  print!("{}", heap.free_list());

  let third = heap.allocate(16)?;
  println!(
    "[3] allocate(16) reused the freed block? {}",
    if third == first { "Yes" } else { "No" }
  );

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 4) Free everything: neighbours coalesce back into one block.
  // --------------------------------------------------------------------
  heap.deallocate(Some(third));
  heap.deallocate(Some(second));
  println!("\n[4] Deallocated everything");
  print!("{}", heap.free_list());

  block_until_enter_pressed();

  // --------------------------------------------------------------------
  // 5) A request larger than the increment grows the heap by its own size.
  // --------------------------------------------------------------------
  print_program_break("before large alloc");

  let big = heap.allocate(64 * 1024)?;
  println!("\n[5] allocate(64 KiB)");
  print_alloc(&mut heap, big);

  let grown = heap.resize(Some(big), 128 * 1024)?;
  println!("[5] resize to 128 KiB -> {:?}", grown);

  print_program_break("after large alloc");

  let stats = heap.stats();
  println!(
    "\n[6] allocations = {}, deallocations = {}, heap growths = {}",
    stats.allocations, stats.deallocations, stats.growths
  );
  println!("End of example. The heap never shrinks; the OS reclaims it on exit.");

  Ok(())
}
