#![allow(unused)]

mod common;

use common::RamDisk;
use lepton::*;

fn fresh() -> FileSystem<RamDisk> {
    FileSystem::mount(RamDisk::new(MAX_BLOCKS), "disk").unwrap()
}

/// Creates files in fresh subdirectories until exactly `leave` data blocks are free.
/// Leaves the caller back in the directory it started in.
fn fill_blocks(fs: &mut FileSystem<RamDisk>, leave: usize) {
    let mut d = 0;
    while fs.df().free_blocks as usize > leave {
        let dir = format!("fill{}", d);
        fs.mkdir(&dir).unwrap();
        fs.cd(&dir).unwrap();
        let mut i = 0;
        while fs.df().free_blocks as usize > leave && !fs.cwd_entries().is_full() {
            let free = fs.df().free_blocks as usize - leave;
            fs.create(&format!("f{}", i), free.min(NUM_DIRECT_PTRS) * BLOCK_SIZE).unwrap();
            i += 1;
        }
        fs.cd("..").unwrap();
        d += 1;
    }
    assert_eq!(fs.df().free_blocks as usize, leave);
}

#[test]
fn test_format() {
    let fs = fresh();
    let sb = fs.superblock();
    assert_eq!(sb.free_inodes, MAX_INODES as u32 - 1); // Root took one.
    assert_eq!(sb.free_blocks, (MAX_BLOCKS - DATA_START - 1) as u32);
    assert_eq!(fs.block_bitmap().count_set(), DATA_START + 1);
    assert_eq!(fs.inode_bitmap().count_set(), 1);

    assert_eq!(fs.cwd_inode_id(), ROOT_INODE_ID);
    assert_eq!(fs.cwd_block_id(), DATA_START as u32);
    let root = fs.get_inode(ROOT_INODE_ID).unwrap();
    assert_eq!(root.ftype, FileType::Directory);
    assert_eq!(root.blocks, 1);
    assert_eq!(root.direct_ptrs[0], Some(DATA_START as u32));
    assert_eq!((root.owner, root.group), (0, 0));

    // Root holds only its self entry.
    let entries: Vec<_> = fs.ls().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, ".");
    assert_eq!(entries[0].inode_id, ROOT_INODE_ID);
}

#[test]
fn test_scenario() {
    let mut fs = fresh();
    let initial = fs.df();

    let inode_id = fs.create("f", 100).unwrap();
    assert_eq!(inode_id, 1);
    let st = fs.stat("f").unwrap();
    assert_eq!(st.inode_id, 1);
    assert_eq!(st.ftype, FileType::Regular);
    assert_eq!(st.size, 100);
    assert_eq!(st.blocks, 1);
    assert_eq!((st.owner, st.group), (1, 2));

    let original = fs.cat("f").unwrap();
    assert_eq!(original.len(), 100);
    assert!(original.iter().all(|c| c.is_ascii_alphanumeric()));

    assert_eq!(fs.write("f", 0, 5, b"HELLO").unwrap(), 100);
    let content = fs.cat("f").unwrap();
    assert_eq!(&content[..5], b"HELLO");
    assert_eq!(&content[5..], &original[5..]);
    assert_eq!(fs.read("f", 0, 5).unwrap(), b"HELLO");

    let before = fs.df();
    fs.remove("f").unwrap();
    let after = fs.df();
    assert_eq!(after.free_inodes, before.free_inodes + 1);
    assert_eq!(after.free_blocks, before.free_blocks + 1);
    assert_eq!(after, initial);
    assert!(matches!(fs.stat("f"), Err(Error::NotFound)));
    log!("df after scenario: {}", after);
}

#[test]
fn test_create_block_counts() {
    let mut fs = fresh();
    let sizes = [
        ("empty", 0),
        ("one", 1),
        ("exact", BLOCK_SIZE),
        ("over", BLOCK_SIZE + 1),
        ("max", MAX_FILE_SIZE),
    ];
    let mut used = 0;
    for (name, size) in sizes {
        fs.create(name, size).unwrap();
        let st = fs.stat(name).unwrap();
        assert_eq!(st.size as usize, size);
        assert_eq!(st.blocks as usize, blocks_for(size));
        assert_eq!(fs.cat(name).unwrap().len(), size);
        used += blocks_for(size);
    }
    assert_eq!(fs.df().free_blocks as usize, MAX_BLOCKS - DATA_START - 1 - used);
}

#[test]
fn test_create_errors() {
    let mut fs = fresh();
    assert!(matches!(fs.create("big", MAX_FILE_SIZE + 1), Err(Error::FileTooLarge)));
    fs.create("f", 10).unwrap();
    assert!(matches!(fs.create("f", 10), Err(Error::AlreadyExists)));
    assert!(matches!(fs.create("", 10), Err(Error::InvalidFileName)));
    assert!(matches!(fs.create("..", 10), Err(Error::InvalidFileName)));
    assert!(matches!(
        fs.create(&"n".repeat(MAX_FILE_NAME_LEN + 1), 10),
        Err(Error::InvalidFileName)
    ));

    // "." and "f" already take two slots.
    for i in 0..MAX_DIR_ENTRIES - 2 {
        fs.create(&format!("file_{}", i), 0).unwrap();
    }
    let before = fs.df();
    assert!(matches!(fs.create("one_more", 10), Err(Error::DirectoryFull)));
    assert_eq!(fs.df(), before);
}

#[test]
fn test_read() {
    let mut fs = fresh();
    fs.create("f", 10).unwrap();
    let content = fs.cat("f").unwrap();

    assert_eq!(fs.read("f", 4, 100).unwrap(), &content[4..]);
    assert_eq!(fs.read("f", 2, 3).unwrap(), &content[2..5]);
    assert!(fs.read("f", 10, 5).unwrap().is_empty());
    assert!(matches!(fs.read("f", 11, 1), Err(Error::OffsetOutOfRange)));
    assert!(matches!(fs.read("missing", 0, 1), Err(Error::NotFound)));

    fs.mkdir("d").unwrap();
    assert!(matches!(fs.read("d", 0, 1), Err(Error::IsADirectory)));
    assert!(matches!(fs.cat("d"), Err(Error::IsADirectory)));
}

#[test]
fn test_write_grows_file() {
    let mut fs = fresh();
    fs.create("f", 500).unwrap();
    let original = fs.cat("f").unwrap();
    let free = fs.df().free_blocks;

    let data = b"0123456789abcdefghij";
    assert_eq!(fs.write("f", 498, data.len(), data).unwrap(), 518);
    let st = fs.stat("f").unwrap();
    assert_eq!(st.size, 518);
    assert_eq!(st.blocks, 2);
    assert_eq!(fs.df().free_blocks, free - 1);

    assert_eq!(fs.read("f", 498, data.len()).unwrap(), data);
    assert_eq!(fs.read("f", 0, 498).unwrap(), &original[..498]);

    // Appending at the exact end is allowed.
    fs.write("f", 518, 2, b"!!").unwrap();
    assert_eq!(fs.read("f", 516, 10).unwrap(), b"ij!!");
}

#[test]
fn test_write_in_place_keeps_blocks() {
    let mut fs = fresh();
    fs.create("f", 1000).unwrap();
    let blocks_before = fs.get_inode(1).unwrap().direct_ptrs;
    let free = fs.df();
    fs.write("f", 600, 3, b"abc").unwrap();
    assert_eq!(fs.get_inode(1).unwrap().direct_ptrs, blocks_before);
    assert_eq!(fs.df(), free);
    assert_eq!(fs.read("f", 600, 3).unwrap(), b"abc");
}

#[test]
fn test_write_binary_content() {
    let mut fs = fresh();
    fs.create("bin", 0).unwrap();
    let data = [0u8, 1, 0, 0, 2, 0];
    fs.write("bin", 0, data.len(), &data).unwrap();
    assert_eq!(fs.cat("bin").unwrap(), data);
    assert_eq!(fs.read("bin", 1, 4).unwrap(), &data[1..5]);
    assert_eq!(fs.stat("bin").unwrap().size, 6);
}

#[test]
fn test_write_errors() {
    let mut fs = fresh();
    fs.create("f", 10).unwrap();
    assert!(matches!(fs.write("f", 0, 4, b"abc"), Err(Error::InvalidArgument(_))));
    assert!(matches!(fs.write("f", 11, 1, b"a"), Err(Error::OffsetOutOfRange)));
    assert!(matches!(fs.write("nope", 0, 1, b"a"), Err(Error::NotFound)));

    fs.create("max", MAX_FILE_SIZE).unwrap();
    assert!(matches!(
        fs.write("max", MAX_FILE_SIZE, 1, b"a"),
        Err(Error::FileTooLarge)
    ));
    assert_eq!(fs.stat("max").unwrap().size as usize, MAX_FILE_SIZE);

    fs.mkdir("d").unwrap();
    assert!(matches!(fs.write("d", 0, 1, b"a"), Err(Error::IsADirectory)));
}

#[test]
fn test_out_of_blocks() {
    let mut fs = fresh();
    fs.create("g", 100).unwrap();
    let original = fs.cat("g").unwrap();
    fill_blocks(&mut fs, 1);

    // Growing by two blocks with one free fails and changes nothing.
    let before = fs.df();
    let data = vec![b'x'; 1000];
    assert!(matches!(
        fs.write("g", 100, data.len(), &data),
        Err(Error::InsufficientSpace(_))
    ));
    assert_eq!(fs.df(), before);
    assert_eq!(fs.cat("g").unwrap(), original);
    assert_eq!(fs.stat("g").unwrap().blocks, 1);

    assert!(matches!(fs.create("h", 1024), Err(Error::InsufficientSpace(_))));

    // Growing by one block still fits.
    fs.write("g", 100, 500, &data[..500]).unwrap();
    assert_eq!(fs.stat("g").unwrap().blocks, 2);
    assert_eq!(fs.df().free_blocks, 0);

    // A directory needs a block too; the inode it took is given back.
    let inodes = fs.df().free_inodes;
    assert!(matches!(fs.mkdir("late"), Err(Error::InsufficientSpace(_))));
    assert_eq!(fs.df().free_inodes, inodes);
    assert!(matches!(fs.stat("late"), Err(Error::NotFound)));

    // Empty files need no block.
    fs.create("empty", 0).unwrap();
}

#[test]
fn test_remove_reuses_resources() {
    let mut fs = fresh();
    for name in ["a", "b", "c"] {
        fs.create(name, 100).unwrap();
    }
    let b = fs.get_inode(fs.stat("b").unwrap().inode_id).unwrap();
    let high_water = fs.block_bitmap().count_set();

    fs.remove("b").unwrap();
    assert!(matches!(fs.stat("b"), Err(Error::NotFound)));
    assert_eq!(fs.block_bitmap().count_set(), high_water - 1);

    let d = fs.create("d", 100).unwrap();
    assert_eq!(d, 2);
    assert_eq!(fs.get_inode(d).unwrap().direct_ptrs[0], b.direct_ptrs[0]);
    assert_eq!(fs.block_bitmap().count_set(), high_water);

    // The vacated slot is reused, so "d" lists where "b" was.
    let names: Vec<_> = fs.ls().map(|e| e.name).collect();
    assert_eq!(names, [".", "a", "d", "c"]);

    // Remove then create of the same name.
    fs.remove("a").unwrap();
    assert_eq!(fs.create("a", 100).unwrap(), 1);
}

#[test]
fn test_remove_errors() {
    let mut fs = fresh();
    assert!(matches!(fs.remove("ghost"), Err(Error::NotFound)));
    fs.mkdir("d").unwrap();
    assert!(matches!(fs.remove("d"), Err(Error::IsADirectory)));
    assert!(fs.stat("d").is_ok());
}

#[test]
fn test_stat_report() {
    let mut fs = fresh();
    fs.create("f", 700).unwrap();
    let st = fs.stat("f").unwrap();
    assert!(st.last_access >= st.created);
    let text = st.to_string();
    log!("stat output:\n{}", text);
    assert!(text.starts_with("Inode = 1\ntype = file\nowner = 1\ngroup = 2\nsize = 700\nnum of block = 2\n"));
    assert!(text.contains("Created time = "));
    assert!(text.trim_end().ends_with('Z'));

    let root = fs.stat(".").unwrap();
    assert_eq!(root.ftype, FileType::Directory);
    assert_eq!(root.inode_id, ROOT_INODE_ID);
}

#[test]
fn test_read_updates_last_access() {
    let mut fs = fresh();
    fs.create("f", 10).unwrap();
    let before = fs.stat("f").unwrap().last_access;
    std::thread::sleep(std::time::Duration::from_millis(2));
    fs.read("f", 0, 1).unwrap();
    assert!(fs.stat("f").unwrap().last_access > before);
}

#[test]
fn test_credentials() {
    let mut fs = FileSystem::mount_as(RamDisk::new(MAX_BLOCKS), "disk", Credentials::new(7, 8)).unwrap();
    fs.create("f", 1).unwrap();
    fs.mkdir("d").unwrap();
    let f = fs.stat("f").unwrap();
    let d = fs.stat("d").unwrap();
    assert_eq!((f.owner, f.group), (7, 8));
    assert_eq!((d.owner, d.group), (7, 8));
    assert_eq!(fs.stat(".").unwrap().owner, 0);
}
